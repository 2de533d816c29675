use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::state::RunPhase;
use crate::backend::CloudClient;
use crate::errors::{CensusError, RetryPolicy};
use crate::models::{ProbeOutcome, Provider, ProviderSummary};
use crate::probes::{catalog, ListingProbe, ResourceKind, ResourceProbe};
use crate::scope::{discover_scopes, fall_back};

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Knobs shared by every provider in a run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Maximum probes in flight per provider.
    pub concurrency: usize,
    /// Global deadline for the whole run.
    pub timeout: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Runs every selected probe of one provider across its scopes.
pub struct ProviderAggregator {
    provider: Provider,
    client: Arc<dyn CloudClient>,
    settings: RunSettings,
    phase: Arc<RwLock<RunPhase>>,
}

impl ProviderAggregator {
    pub fn new(client: Arc<dyn CloudClient>, settings: RunSettings) -> Self {
        Self {
            provider: client.provider(),
            client,
            settings,
            phase: Arc::new(RwLock::new(RunPhase::Idle)),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub async fn phase(&self) -> RunPhase {
        *self.phase.read().await
    }

    /// Shared handle for observing the phase from another task.
    pub fn phase_handle(&self) -> Arc<RwLock<RunPhase>> {
        self.phase.clone()
    }

    async fn set_phase(&self, phase: RunPhase) {
        let mut current = self.phase.write().await;
        *current = phase;
        debug!(provider = %self.provider, %phase, "Phase changed");
    }

    /// Resolve scopes, probe `selected` kinds (all when `None`) in every scope and
    /// collect the outcomes. When `cancel` fires, in-flight probes are abandoned and
    /// reported as timeouts.
    #[instrument(skip_all, fields(provider = %self.provider))]
    pub async fn run(
        &self,
        explicit_scopes: &[String],
        selected: Option<&[String]>,
        cancel: &CancellationToken,
    ) -> ProviderSummary {
        self.set_phase(RunPhase::ScopesResolving).await;
        let resolution = tokio::select! {
            biased;
            res = discover_scopes(self.provider, explicit_scopes, self.client.as_ref(), &self.settings.retry) => res,
            _ = cancel.cancelled() => fall_back(
                self.provider,
                self.client.as_ref(),
                format!("{} discovery abandoned when the run timeout fired", self.provider.scope_label()),
                CensusError::Timeout,
            ),
        };

        let kinds = catalog::select(self.provider, selected);
        let pairs: Vec<(&'static ResourceKind, String)> = kinds
            .iter()
            .flat_map(|kind| resolution.scopes.iter().map(move |scope| (*kind, scope.clone())))
            .collect();

        info!(
            scopes = resolution.scopes.len(),
            resources = kinds.len(),
            probes = pairs.len(),
            "Dispatching probes"
        );
        self.set_phase(RunPhase::ProbesDispatched).await;

        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (idx, (kind, scope)) in pairs.iter().enumerate() {
            let probe = ListingProbe::new(*kind, self.client.clone(), self.settings.retry.clone());
            let semaphore = semaphore.clone();
            let scope = scope.clone();
            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => probe.probe(&scope).await,
                    Err(_) => ProbeOutcome::failure(
                        probe.provider(),
                        probe.resource_type(),
                        &scope,
                        &CensusError::Internal("probe semaphore closed".into()),
                    ),
                };
                (idx, outcome)
            });
        }

        self.set_phase(RunPhase::Collecting).await;
        let mut slots: Vec<Option<ProbeOutcome>> = vec![None; pairs.len()];
        loop {
            tokio::select! {
                biased;
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok((idx, outcome))) => slots[idx] = Some(outcome),
                    Some(Err(e)) => error!(error = %e, "Probe task panicked"),
                },
                _ = cancel.cancelled() => {
                    warn!(pending = tasks.len(), "Run timeout fired, abandoning in-flight probes");
                    tasks.abort_all();
                    break;
                }
            }
        }

        let timed_out = cancel.is_cancelled();
        let outcomes: Vec<ProbeOutcome> = slots
            .into_iter()
            .zip(&pairs)
            .map(|(slot, (kind, scope))| match slot {
                Some(outcome) => outcome,
                None if timed_out => ProbeOutcome::timed_out(self.provider, kind.type_name, scope),
                None => ProbeOutcome::failure(
                    self.provider,
                    kind.type_name,
                    scope,
                    &CensusError::Internal("probe task aborted".into()),
                ),
            })
            .collect();

        let summary = ProviderSummary::new(self.provider, resolution.scopes, outcomes, resolution.warnings)
            .with_provider_errors(resolution.failure.into_iter().collect());
        self.set_phase(RunPhase::Summarized).await;
        info!(
            total = summary.total_count(),
            errors = summary.error_count(),
            "Provider run complete"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Snapshot, SnapshotClient};
    use crate::errors::ErrorKind;

    fn aggregator(provider: Provider, yaml: &str, settings: RunSettings) -> ProviderAggregator {
        let snapshot = Snapshot::parse(yaml).unwrap();
        let data = snapshot.for_provider(provider).cloned().unwrap();
        ProviderAggregator::new(Arc::new(SnapshotClient::new(provider, data)), settings)
    }

    #[tokio::test]
    async fn test_cross_product_of_kinds_and_scopes() {
        let agg = aggregator(
            Provider::Gcp,
            "gcp: { scopes: [proj-a, proj-b] }",
            RunSettings::default(),
        );
        assert_eq!(agg.phase().await, RunPhase::Idle);
        let summary = agg.run(&[], None, &CancellationToken::new()).await;
        assert_eq!(summary.outcomes.len(), 10);
        assert!(summary.outcomes.iter().all(ProbeOutcome::is_success));
        assert_eq!(summary.total_count(), 0);
        assert_eq!(agg.phase().await, RunPhase::Summarized);
    }

    #[tokio::test]
    async fn test_filter_skips_unselected_kinds() {
        let agg = aggregator(Provider::Azure, "azure: {}", RunSettings::default());
        let filter = vec!["vms".to_string(), "aks".to_string()];
        let scopes = vec!["sub-1".to_string()];
        let summary = agg.run(&scopes, Some(&filter), &CancellationToken::new()).await;
        let types: Vec<&str> = summary.outcomes.iter().map(ProbeOutcome::resource_type).collect();
        assert_eq!(types, vec!["AKSNodes", "VirtualMachines"]);
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_completes() {
        let settings = RunSettings { concurrency: 1, ..RunSettings::default() };
        let agg = aggregator(
            Provider::Aws,
            r#"
aws:
  listings:
    - resource: ec2
      scope: us-east-1
      pages: [{ items: [{ State: { Name: running } }] }]
"#,
            settings,
        );
        let scopes = vec!["us-east-1".to_string(), "us-west-2".to_string()];
        let summary = agg.run(&scopes, None, &CancellationToken::new()).await;
        assert_eq!(summary.outcomes.len(), 12);
        assert_eq!(summary.total_count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_marks_every_pair_timed_out() {
        let agg = aggregator(
            Provider::Aws,
            r#"
aws:
  listings:
    - resource: ec2
      scope: us-east-1
      pages: [{ items: [{}], delay_ms: 60000 }]
"#,
            RunSettings::default(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let filter = vec!["ec2".to_string()];
        let scopes = vec!["us-east-1".to_string()];
        let summary = agg.run(&scopes, Some(&filter), &cancel).await;
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.failures().next().unwrap().kind, ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_cancelled_discovery_without_fallback_records_timeout() {
        let agg = aggregator(
            Provider::Gcp,
            "gcp: { discovery_error: { code: UNAVAILABLE, message: backend down } }",
            RunSettings::default(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let summary = agg.run(&[], None, &cancel).await;
        assert!(summary.outcomes.is_empty());
        assert_eq!(summary.provider_errors.len(), 1);
        assert_eq!(summary.provider_errors[0].kind, ErrorKind::Timeout);
        assert_eq!(summary.error_count(), 1);
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::provider::{ProviderAggregator, RunSettings};
use crate::backend::ClientFactory;
use crate::errors::CensusError;
use crate::models::{MultiCloudReport, Provider, ProviderFailure, ProviderResult};

/// What to inventory for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub provider: Provider,
    /// Empty means discover.
    pub explicit_scopes: Vec<String>,
    /// Catalog tags to probe; `None` probes every kind.
    pub resources: Option<Vec<String>>,
}

impl ProviderRequest {
    pub fn new(provider: Provider) -> Self {
        Self { provider, explicit_scopes: Vec::new(), resources: None }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.explicit_scopes = scopes;
        self
    }

    pub fn with_resources(mut self, resources: Option<Vec<String>>) -> Self {
        self.resources = resources;
        self
    }
}

/// Fans a run out over several providers and assembles one report.
pub struct CrossProviderAggregator {
    factory: Arc<dyn ClientFactory>,
    settings: RunSettings,
    cancel_token: CancellationToken,
}

impl CrossProviderAggregator {
    pub fn new(factory: Arc<dyn ClientFactory>, settings: RunSettings) -> Self {
        Self { factory, settings, cancel_token: CancellationToken::new() }
    }

    /// Replace the internal cancel token with an external one, e.g. wired to Ctrl-C.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Run every request concurrently. Provider-level failures are recorded in the
    /// report instead of aborting the run; a provider requested twice runs once.
    #[instrument(skip_all, fields(providers = requests.len()))]
    pub async fn run_all(&self, requests: Vec<ProviderRequest>) -> MultiCloudReport {
        let deadline = self.settings.timeout.map(|t| arm_deadline(&self.cancel_token, t));

        let mut results: Vec<ProviderResult> = Vec::new();
        let mut pending: Vec<(Provider, JoinHandle<ProviderResult>)> = Vec::new();
        let mut seen: Vec<Provider> = Vec::new();

        for request in requests {
            if seen.contains(&request.provider) {
                warn!(provider = %request.provider, "Provider requested twice, ignoring duplicate");
                continue;
            }
            seen.push(request.provider);

            let client = match self.factory.connect(request.provider) {
                Ok(client) => client,
                Err(e) => {
                    warn!(provider = %request.provider, error = %e, "Provider setup failed");
                    results.push(provider_failed(request.provider, &e));
                    continue;
                }
            };

            let settings = self.settings.clone();
            let cancel = self.cancel_token.clone();
            let handle = tokio::spawn(async move {
                let aggregator = ProviderAggregator::new(client, settings);
                let summary = aggregator
                    .run(&request.explicit_scopes, request.resources.as_deref(), &cancel)
                    .await;
                ProviderResult::Completed(summary)
            });
            pending.push((request.provider, handle));
        }

        let (providers, handles): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
        let joined = futures::future::join_all(handles).await;
        for (provider, result) in providers.into_iter().zip(joined) {
            match result {
                Ok(provider_result) => results.push(provider_result),
                Err(e) => {
                    error!(%provider, error = %e, "Provider task panicked");
                    let err = CensusError::Internal(format!("provider task failed: {}", e));
                    results.push(provider_failed(provider, &err));
                }
            }
        }

        if let Some(handle) = deadline {
            handle.abort();
        }

        let report = MultiCloudReport::new(results);
        info!(
            run_id = %report.run_id,
            grand_total = report.grand_total(),
            errors = report.errors().len(),
            "Inventory run complete"
        );
        report
    }
}

fn provider_failed(provider: Provider, err: &CensusError) -> ProviderResult {
    ProviderResult::Failed(ProviderFailure::from_error(provider, err))
}

/// Cancel `token` once `timeout` elapses.
fn arm_deadline(token: &CancellationToken, timeout: Duration) -> JoinHandle<()> {
    let token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout_secs = timeout.as_secs_f64(), "Run timeout reached, cancelling");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Snapshot, SnapshotFactory, UnlinkedFactory};
    use crate::errors::ErrorKind;

    #[tokio::test]
    async fn test_unlinked_factory_fails_every_provider() {
        let agg = CrossProviderAggregator::new(Arc::new(UnlinkedFactory), RunSettings::default());
        let report = agg
            .run_all(vec![ProviderRequest::new(Provider::Gcp), ProviderRequest::new(Provider::Aws)])
            .await;
        let order: Vec<Provider> = report.providers.iter().map(ProviderResult::provider).collect();
        assert_eq!(order, vec![Provider::Aws, Provider::Gcp]);
        assert_eq!(report.errors().len(), 2);
        assert!(report.errors().iter().all(|e| e.kind == ErrorKind::ProviderSetup));
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_request_runs_once() {
        let snapshot = Snapshot::parse("gcp: { scopes: [proj-a] }").unwrap();
        let agg = CrossProviderAggregator::new(Arc::new(SnapshotFactory::new(snapshot)), RunSettings::default());
        let report = agg
            .run_all(vec![ProviderRequest::new(Provider::Gcp), ProviderRequest::new(Provider::Gcp)])
            .await;
        assert_eq!(report.providers.len(), 1);
        assert_eq!(report.exit_code(), 0);
    }
}

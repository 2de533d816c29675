use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::catalog::{ResourceKind, Tally};
use crate::backend::CloudClient;
use crate::errors::{with_retry, RetryPolicy};
use crate::models::{ProbeOutcome, Provider, ResourceRecord};

/// Counts one resource type in one scope.
///
/// Probes never return `Err`: every failure is folded into
/// [`ProbeOutcome::Failure`] so the aggregator can keep going.
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    fn provider(&self) -> Provider;

    /// Normalized type name, e.g. `EC2Instances`.
    fn resource_type(&self) -> &str;

    async fn probe(&self, scope: &str) -> ProbeOutcome;
}

/// Probe that pages through a client listing and tallies each item.
pub struct ListingProbe {
    kind: &'static ResourceKind,
    client: Arc<dyn CloudClient>,
    retry: RetryPolicy,
}

impl ListingProbe {
    pub fn new(kind: &'static ResourceKind, client: Arc<dyn CloudClient>, retry: RetryPolicy) -> Self {
        Self { kind, client, retry }
    }

    pub fn kind(&self) -> &'static ResourceKind {
        self.kind
    }

    fn record(&self, scope: &str, tally: Tally, notes: Vec<String>) -> ProbeOutcome {
        let mut record = ResourceRecord::empty(self.kind.provider, self.kind.type_name, scope);
        record.count = tally.count;
        if !tally.breakdown.is_empty() {
            record.detail = Some(tally.breakdown);
        }
        record.notes = notes;
        ProbeOutcome::Success(record)
    }
}

#[async_trait]
impl ResourceProbe for ListingProbe {
    fn provider(&self) -> Provider {
        self.kind.provider
    }

    fn resource_type(&self) -> &str {
        self.kind.type_name
    }

    async fn probe(&self, scope: &str) -> ProbeOutcome {
        let kind = self.kind;
        let op_name = format!("{}:{}:{}", kind.provider.key(), kind.tag, scope);
        let mut tally = Tally::default();
        let mut notes = Vec::new();
        let mut seen_tokens: HashSet<String> = HashSet::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let client = &self.client;
            let current = token.as_deref();
            let result = with_retry(&op_name, &self.retry, || client.list_page(kind.tag, scope, current)).await;

            let page = match result {
                Ok(page) => page,
                Err(e) if pages == 0 && e.is_not_found() => {
                    debug!(provider = %kind.provider, resource = kind.tag, scope, "Listing not found, counting as absent");
                    if !kind.absent_on_not_found {
                        notes.push(format!("listing not found ({}), counted as 0", e));
                    }
                    return self.record(scope, tally, notes);
                }
                Err(e) if pages == 0 => {
                    warn!(provider = %kind.provider, resource = kind.tag, scope, error = %e, "Probe failed");
                    return ProbeOutcome::failure(kind.provider, kind.type_name, scope, &e);
                }
                Err(e) => {
                    warn!(
                        provider = %kind.provider,
                        resource = kind.tag,
                        scope,
                        pages,
                        error = %e,
                        "Listing failed mid-pagination, keeping partial count"
                    );
                    notes.push(format!("partial count after {} page(s): {}", pages, e));
                    return self.record(scope, tally, notes);
                }
            };

            pages += 1;
            for item in &page.items {
                (kind.tally)(item, &mut tally);
            }

            match page.next_token {
                None => break,
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    warn!(provider = %kind.provider, resource = kind.tag, scope, token = %next, "Continuation token repeated");
                    notes.push(format!("pagination stopped on repeated token after {} page(s)", pages));
                    break;
                }
                Some(next) => token = Some(next),
            }
        }

        debug!(provider = %kind.provider, resource = kind.tag, scope, count = tally.count, pages, "Probe complete");
        self.record(scope, tally, notes)
    }
}

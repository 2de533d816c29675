//! Resolves which regions / subscriptions / projects a provider run covers.

use tracing::{debug, error, info, warn};

use crate::backend::CloudClient;
use crate::errors::{with_retry, CensusError, RetryPolicy};
use crate::models::{Provider, ProviderFailure, ScopeOrigin, ScopeSet};

/// Regions queried when AWS region discovery is unavailable.
pub const AWS_FALLBACK_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "eu-central-1",
    "ap-southeast-1",
    "ap-northeast-1",
];

#[derive(Debug, Clone)]
pub struct ScopeResolution {
    pub scopes: ScopeSet,
    pub warnings: Vec<String>,
    /// Set when discovery failed and no fallback scope exists.
    pub failure: Option<ProviderFailure>,
}

impl ScopeResolution {
    fn resolved(scopes: ScopeSet) -> Self {
        Self { scopes, warnings: Vec::new(), failure: None }
    }
}

/// Pick the scope set for `provider`.
///
/// A non-empty explicit list is used as-is and discovery is never called. Otherwise
/// discovery runs under `policy`; a failure or an empty result falls back to the
/// provider's static list with exactly one warning. With nothing to fall back to the
/// resolution carries a `RegionDiscovery` failure instead.
pub async fn discover_scopes(
    provider: Provider,
    explicit: &[String],
    client: &dyn CloudClient,
    policy: &RetryPolicy,
) -> ScopeResolution {
    let explicit = ScopeSet::new(ScopeOrigin::Explicit, explicit);
    if !explicit.is_empty() {
        debug!(%provider, count = explicit.len(), "Using explicit scopes");
        return ScopeResolution::resolved(explicit);
    }

    let op_name = format!("{}:discover-scopes", provider.key());
    let reason = match with_retry(&op_name, policy, || client.discover_scopes()).await {
        Ok(found) => {
            let scopes = ScopeSet::new(ScopeOrigin::Discovered, found);
            if !scopes.is_empty() {
                info!(%provider, count = scopes.len(), "Discovered {}s", provider.scope_label());
                return ScopeResolution::resolved(scopes);
            }
            format!("discovery returned no {}s", provider.scope_label())
        }
        Err(e) => format!("{} discovery failed: {}", provider.scope_label(), e),
    };

    fall_back(provider, client, reason, CensusError::RegionDiscovery)
}

/// Resolve to the fallback scopes after `reason` ruled out discovery. An empty fallback
/// turns `reason` into a provider-level failure built by `on_empty`.
pub fn fall_back(
    provider: Provider,
    client: &dyn CloudClient,
    reason: String,
    on_empty: fn(String) -> CensusError,
) -> ScopeResolution {
    let scopes = fallback_scopes(provider, client);
    if scopes.is_empty() {
        let err = on_empty(format!("{}; no fallback {} available", reason, provider.scope_label()));
        error!(%provider, error = %err, "No scopes to probe");
        return ScopeResolution {
            scopes,
            warnings: Vec::new(),
            failure: Some(ProviderFailure::from_error(provider, &err)),
        };
    }

    let warning = format!("{}; using fallback {}s: {}", reason, provider.scope_label(), scopes.as_slice().join(", "));
    warn!(%provider, "{}", warning);
    ScopeResolution { scopes, warnings: vec![warning], failure: None }
}

/// Static scopes used when discovery is unavailable.
pub fn fallback_scopes(provider: Provider, client: &dyn CloudClient) -> ScopeSet {
    match provider {
        Provider::Aws => ScopeSet::new(ScopeOrigin::Fallback, AWS_FALLBACK_REGIONS),
        Provider::Azure | Provider::Gcp => ScopeSet::new(ScopeOrigin::Fallback, client.default_scope()),
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::CensusError;
use crate::models::Provider;

/// One page of a provider listing call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<serde_json::Value>,
    /// Continuation token; `None` on the last page.
    pub next_token: Option<String>,
}

/// Read-only handle onto one provider account.
///
/// Implementations wrap a provider SDK and must only issue list/describe/get calls.
/// Errors are expected to be mapped through
/// [`classify_provider_error`](crate::errors::classify_provider_error).
#[async_trait]
pub trait CloudClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Enumerate the regions / subscriptions / projects visible to the credentials.
    async fn discover_scopes(&self) -> Result<Vec<String>, CensusError>;

    /// Scope implied by the credentials (default subscription, credential project).
    fn default_scope(&self) -> Option<String> {
        None
    }

    /// Fetch one page of `resource` (a catalog tag such as `ec2`) in `scope`.
    async fn list_page(
        &self,
        resource: &str,
        scope: &str,
        token: Option<&str>,
    ) -> Result<Page, CensusError>;
}

/// Builds the per-provider client handed to each provider aggregator.
pub trait ClientFactory: Send + Sync {
    /// Errors here are provider-wide setup failures (missing SDK, no credentials).
    fn connect(&self, provider: Provider) -> Result<Arc<dyn CloudClient>, CensusError>;
}

/// Factory used when no backend is configured: every provider fails setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlinkedFactory;

impl ClientFactory for UnlinkedFactory {
    fn connect(&self, provider: Provider) -> Result<Arc<dyn CloudClient>, CensusError> {
        Err(CensusError::ProviderSetup(format!(
            "no live {} client is linked into this build; pass --snapshot to replay recorded responses",
            provider
        )))
    }
}

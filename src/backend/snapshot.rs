//! Replay backend: serves provider listings recorded in a YAML or JSON file.
//!
//! ```yaml
//! aws:
//!   scopes: [us-east-1, us-west-2]
//!   listings:
//!     - resource: lambda
//!       scope: us-east-1
//!       pages:
//!         - failures: [{ code: Throttling, message: Rate exceeded }]
//!           items: [{ FunctionName: a }, { FunctionName: b }]
//! azure:
//!   setup_error: no credentials found
//! ```
//!
//! Each page's `failures` are returned one per attempt, in order, before the page
//! succeeds. A (resource, scope) pair with no listing yields one empty page.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{ClientFactory, CloudClient, Page};
use crate::errors::{classify_provider_error, CensusError};
use crate::models::Provider;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub aws: Option<ProviderSnapshot>,
    #[serde(default)]
    pub azure: Option<ProviderSnapshot>,
    #[serde(default)]
    pub gcp: Option<ProviderSnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    /// Fails client construction with this message.
    #[serde(default)]
    pub setup_error: Option<String>,
    /// Result of scope discovery.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Makes every discovery attempt fail with this error.
    #[serde(default)]
    pub discovery_error: Option<RecordedError>,
    #[serde(default)]
    pub default_scope: Option<String>,
    #[serde(default)]
    pub listings: Vec<RecordedListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedError {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedListing {
    pub resource: String,
    pub scope: String,
    #[serde(default)]
    pub pages: Vec<RecordedPage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedPage {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    #[serde(default)]
    pub failures: Vec<RecordedError>,
    /// Simulated call latency.
    #[serde(default)]
    pub delay_ms: u64,
}

impl Snapshot {
    pub async fn load(path: &Path) -> Result<Self, CensusError> {
        if !path.exists() {
            return Err(CensusError::Config(format!("Snapshot file not found: {}", path.display())));
        }
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse YAML (JSON is accepted as a YAML subset).
    pub fn parse(content: &str) -> Result<Self, CensusError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn for_provider(&self, provider: Provider) -> Option<&ProviderSnapshot> {
        match provider {
            Provider::Aws => self.aws.as_ref(),
            Provider::Azure => self.azure.as_ref(),
            Provider::Gcp => self.gcp.as_ref(),
        }
    }
}

/// Serves one provider section of a snapshot.
pub struct SnapshotClient {
    provider: Provider,
    data: ProviderSnapshot,
    /// Failed attempts served so far, keyed by (resource, scope, page index).
    attempts: Mutex<HashMap<(String, String, usize), usize>>,
}

impl SnapshotClient {
    pub fn new(provider: Provider, data: ProviderSnapshot) -> Self {
        Self { provider, data, attempts: Mutex::new(HashMap::new()) }
    }

    fn listing(&self, resource: &str, scope: &str) -> Option<&RecordedListing> {
        self.data
            .listings
            .iter()
            .find(|l| l.resource == resource && l.scope == scope)
    }

    fn error(&self, recorded: &RecordedError) -> CensusError {
        classify_provider_error(self.provider, &recorded.code, &recorded.message)
    }

    /// Returns the failure to serve for this attempt, if any remain.
    fn next_failure(&self, key: (String, String, usize), failures: &[RecordedError]) -> Option<CensusError> {
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let served = attempts.entry(key).or_insert(0);
        let failure = failures.get(*served)?;
        *served += 1;
        Some(self.error(failure))
    }
}

#[async_trait]
impl CloudClient for SnapshotClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn discover_scopes(&self) -> Result<Vec<String>, CensusError> {
        match &self.data.discovery_error {
            Some(err) => Err(self.error(err)),
            None => Ok(self.data.scopes.clone()),
        }
    }

    fn default_scope(&self) -> Option<String> {
        self.data.default_scope.clone()
    }

    async fn list_page(
        &self,
        resource: &str,
        scope: &str,
        token: Option<&str>,
    ) -> Result<Page, CensusError> {
        let Some(listing) = self.listing(resource, scope) else {
            return Ok(Page::default());
        };

        let index = match token {
            None => 0,
            Some(t) => t
                .parse::<usize>()
                .map_err(|_| CensusError::Internal(format!("Invalid continuation token: {}", t)))?,
        };
        let Some(page) = listing.pages.get(index) else {
            if index == 0 {
                return Ok(Page::default());
            }
            return Err(CensusError::Internal(format!("Unknown continuation token: {}", index)));
        };

        if page.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(page.delay_ms)).await;
        }

        let key = (resource.to_string(), scope.to_string(), index);
        if let Some(err) = self.next_failure(key, &page.failures) {
            debug!(provider = %self.provider, resource, scope, page = index, error = %err, "Replaying recorded failure");
            return Err(err);
        }

        let next_token = (index + 1 < listing.pages.len()).then(|| (index + 1).to_string());
        Ok(Page { items: page.items.clone(), next_token })
    }
}

/// Builds [`SnapshotClient`]s from a loaded snapshot.
pub struct SnapshotFactory {
    snapshot: Snapshot,
}

impl SnapshotFactory {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

impl ClientFactory for SnapshotFactory {
    fn connect(&self, provider: Provider) -> Result<Arc<dyn CloudClient>, CensusError> {
        let data = self.snapshot.for_provider(provider).ok_or_else(|| {
            CensusError::ProviderSetup(format!("snapshot has no {} section", provider.key()))
        })?;
        if let Some(msg) = &data.setup_error {
            return Err(CensusError::ProviderSetup(msg.clone()));
        }
        Ok(Arc::new(SnapshotClient::new(provider, data.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
aws:
  scopes: [us-east-1, us-west-2]
  listings:
    - resource: ec2
      scope: us-east-1
      pages:
        - items: [{ InstanceId: i-1 }, { InstanceId: i-2 }]
        - failures: [{ code: Throttling, message: Rate exceeded }]
          items: [{ InstanceId: i-3 }]
azure:
  setup_error: no credentials found
"#;

    fn aws_client() -> SnapshotClient {
        let snapshot = Snapshot::parse(SNAPSHOT).unwrap();
        SnapshotClient::new(Provider::Aws, snapshot.aws.unwrap())
    }

    #[tokio::test]
    async fn test_pages_are_chained_by_token() {
        let client = aws_client();
        let first = client.list_page("ec2", "us-east-1", None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_failures_served_before_page() {
        let client = aws_client();
        let err = client.list_page("ec2", "us-east-1", Some("1")).await.unwrap_err();
        assert!(matches!(err, CensusError::Throttle(_)));
        let page = client.list_page("ec2", "us-east-1", Some("1")).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn test_missing_listing_is_empty_page() {
        let client = aws_client();
        let page = client.list_page("lambda", "us-west-2", None).await.unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_token.is_none());
    }

    #[tokio::test]
    async fn test_bad_token_is_internal_error() {
        let client = aws_client();
        let err = client.list_page("ec2", "us-east-1", Some("abc")).await.unwrap_err();
        assert!(matches!(err, CensusError::Internal(_)));
    }

    #[test]
    fn test_factory_setup_errors() {
        let factory = SnapshotFactory::new(Snapshot::parse(SNAPSHOT).unwrap());
        assert!(factory.connect(Provider::Aws).is_ok());
        assert!(matches!(factory.connect(Provider::Azure), Err(CensusError::ProviderSetup(_))));
        assert!(matches!(factory.connect(Provider::Gcp), Err(CensusError::ProviderSetup(_))));
    }
}

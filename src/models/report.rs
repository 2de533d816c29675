use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::provider::Provider;
use super::summary::ProviderSummary;
use crate::errors::{CensusError, ErrorKind};

/// A provider that could not be queried at all (no client, no credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: Provider,
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn from_error(provider: Provider, error: &CensusError) -> Self {
        Self { provider, kind: error.classify().kind, message: error.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProviderResult {
    Completed(ProviderSummary),
    Failed(ProviderFailure),
}

impl ProviderResult {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderResult::Completed(s) => s.provider,
            ProviderResult::Failed(f) => f.provider,
        }
    }

    pub fn summary(&self) -> Option<&ProviderSummary> {
        match self {
            ProviderResult::Completed(s) => Some(s),
            ProviderResult::Failed(_) => None,
        }
    }

    pub fn total_count(&self) -> u64 {
        self.summary().map(ProviderSummary::total_count).unwrap_or(0)
    }

    pub fn errors(&self) -> Vec<ReportError> {
        match self {
            ProviderResult::Completed(s) => s
                .provider_errors
                .iter()
                .map(ReportError::from_provider_failure)
                .chain(s.failures().map(|f| ReportError {
                    provider: f.provider,
                    resource_type: Some(f.resource_type.clone()),
                    scope: Some(f.scope.clone()),
                    kind: f.kind,
                    reason: f.message.clone(),
                }))
                .collect(),
            ProviderResult::Failed(f) => vec![ReportError::from_provider_failure(f)],
        }
    }
}

/// One unrecovered failure as listed in the report's errors section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportError {
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub kind: ErrorKind,
    pub reason: String,
}

impl ReportError {
    fn from_provider_failure(f: &ProviderFailure) -> Self {
        Self {
            provider: f.provider,
            resource_type: None,
            scope: None,
            kind: f.kind,
            reason: f.message.clone(),
        }
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.provider)?;
        if let Some(rt) = &self.resource_type {
            write!(f, " {}", rt)?;
        }
        if let Some(scope) = &self.scope {
            write!(f, " [{}]", scope)?;
        }
        write!(f, ": {} ({})", self.reason, self.kind)
    }
}

/// The assembled multi-cloud inventory for one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiCloudReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub generator: String,
    /// One entry per attempted provider, in AWS, Azure, GCP order.
    pub providers: Vec<ProviderResult>,
}

impl MultiCloudReport {
    pub fn new(mut providers: Vec<ProviderResult>) -> Self {
        providers.sort_by_key(ProviderResult::provider);
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            generator: crate::generator_string(),
            providers,
        }
    }

    pub fn provider(&self, provider: Provider) -> Option<&ProviderResult> {
        self.providers.iter().find(|p| p.provider() == provider)
    }

    pub fn grand_total(&self) -> u64 {
        self.providers
            .iter()
            .fold(0, |acc, p| acc.saturating_add(p.total_count()))
    }

    pub fn errors(&self) -> Vec<ReportError> {
        self.providers.iter().flat_map(ProviderResult::errors).collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter_map(ProviderResult::summary)
            .flat_map(|s| {
                s.all_warnings()
                    .into_iter()
                    .map(move |w| format!("{}: {}", s.provider, w))
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.providers.iter().any(|p| match p {
            ProviderResult::Completed(s) => s.error_count() > 0,
            ProviderResult::Failed(_) => true,
        })
    }

    /// 0 when every probe and provider completed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() { 1 } else { 0 }
    }
}

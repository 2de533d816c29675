use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aggregate::{RunSettings, DEFAULT_CONCURRENCY};
use crate::errors::RetryPolicy;
use crate::models::Provider;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CensusConfig {
    pub run: Option<RunConfig>,
    pub retry: Option<RetryConfig>,
    pub aws: Option<AwsConfig>,
    pub azure: Option<AzureConfig>,
    pub gcp: Option<GcpConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RunConfig {
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub jitter_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AwsConfig {
    pub regions: Option<Vec<String>>,
    pub resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AzureConfig {
    pub subscriptions: Option<Vec<String>>,
    pub resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GcpConfig {
    pub projects: Option<Vec<String>>,
    pub resources: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OutputConfig {
    pub format: Option<OutputFormat>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CensusConfig {
    /// Retry policy with file values layered over the defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::default();
        if let Some(retry) = &self.retry {
            if let Some(n) = retry.max_attempts {
                policy.max_attempts = n;
            }
            if let Some(ms) = retry.base_delay_ms {
                policy.base_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = retry.max_delay_ms {
                policy.max_delay = Duration::from_millis(ms);
            }
            if let Some(ms) = retry.jitter_ms {
                policy.jitter = Duration::from_millis(ms);
            }
        }
        policy
    }

    pub fn run_settings(&self) -> RunSettings {
        let run = self.run.clone().unwrap_or_default();
        RunSettings {
            concurrency: run.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            timeout: run.timeout_secs.map(Duration::from_secs),
            retry: self.retry_policy(),
        }
    }

    /// Explicit scopes configured for `provider`, empty when discovery should run.
    pub fn scopes_for(&self, provider: Provider) -> Vec<String> {
        let scopes = match provider {
            Provider::Aws => self.aws.as_ref().and_then(|c| c.regions.clone()),
            Provider::Azure => self.azure.as_ref().and_then(|c| c.subscriptions.clone()),
            Provider::Gcp => self.gcp.as_ref().and_then(|c| c.projects.clone()),
        };
        scopes.unwrap_or_default()
    }

    pub fn resources_for(&self, provider: Provider) -> Option<Vec<String>> {
        match provider {
            Provider::Aws => self.aws.as_ref().and_then(|c| c.resources.clone()),
            Provider::Azure => self.azure.as_ref().and_then(|c| c.resources.clone()),
            Provider::Gcp => self.gcp.as_ref().and_then(|c| c.resources.clone()),
        }
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::provider::Provider;
use crate::errors::{CensusError, ErrorKind};

/// Count of one resource type within one scope, as produced by a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub provider: Provider,
    pub resource_type: String,
    pub scope: String,
    pub count: u64,
    /// Sub-counts such as instances per state. Sums to `count` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<BTreeMap<String, u64>>,
    /// Soft warnings raised while listing (partial pages, absent service).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl ResourceRecord {
    pub fn empty(provider: Provider, resource_type: &str, scope: &str) -> Self {
        Self {
            provider,
            resource_type: resource_type.to_string(),
            scope: scope.to_string(),
            count: 0,
            detail: None,
            notes: Vec::new(),
        }
    }
}

/// A probe that could not produce a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub provider: Provider,
    pub resource_type: String,
    pub scope: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Result of one probe invocation: "nothing found" is a `Success` with count 0,
/// "could not ask" is a `Failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProbeOutcome {
    Success(ResourceRecord),
    Failure(ProbeFailure),
}

impl ProbeOutcome {
    pub fn failure(provider: Provider, resource_type: &str, scope: &str, error: &CensusError) -> Self {
        ProbeOutcome::Failure(ProbeFailure {
            provider,
            resource_type: resource_type.to_string(),
            scope: scope.to_string(),
            kind: error.classify().kind,
            message: error.to_string(),
        })
    }

    pub fn timed_out(provider: Provider, resource_type: &str, scope: &str) -> Self {
        ProbeOutcome::Failure(ProbeFailure {
            provider,
            resource_type: resource_type.to_string(),
            scope: scope.to_string(),
            kind: ErrorKind::Timeout,
            message: "abandoned when the run timeout fired".to_string(),
        })
    }

    pub fn resource_type(&self) -> &str {
        match self {
            ProbeOutcome::Success(r) => &r.resource_type,
            ProbeOutcome::Failure(f) => &f.resource_type,
        }
    }

    pub fn scope(&self) -> &str {
        match self {
            ProbeOutcome::Success(r) => &r.scope,
            ProbeOutcome::Failure(f) => &f.scope,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }

    pub fn record(&self) -> Option<&ResourceRecord> {
        match self {
            ProbeOutcome::Success(r) => Some(r),
            ProbeOutcome::Failure(_) => None,
        }
    }

    pub fn failure_info(&self) -> Option<&ProbeFailure> {
        match self {
            ProbeOutcome::Success(_) => None,
            ProbeOutcome::Failure(f) => Some(f),
        }
    }
}

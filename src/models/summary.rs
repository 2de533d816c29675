use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::provider::Provider;
use super::record::{ProbeFailure, ProbeOutcome, ResourceRecord};
use super::report::ProviderFailure;
use super::scope::ScopeSet;

/// Every outcome collected for one provider during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub provider: Provider,
    pub scopes: ScopeSet,
    /// Sorted by resource type, then scope.
    pub outcomes: Vec<ProbeOutcome>,
    /// Provider-level soft warnings (scope fallback, discovery timeout).
    pub warnings: Vec<String>,
    /// Failures not tied to one probe, such as a scope set that could not be resolved.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_errors: Vec<ProviderFailure>,
}

/// Per-resource-type rollup of successful records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTotal {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub count: u64,
    /// Count per scope.
    pub regions: BTreeMap<String, u64>,
}

impl ProviderSummary {
    pub fn new(
        provider: Provider,
        scopes: ScopeSet,
        mut outcomes: Vec<ProbeOutcome>,
        warnings: Vec<String>,
    ) -> Self {
        outcomes.sort_by(|a, b| {
            a.resource_type()
                .cmp(b.resource_type())
                .then_with(|| a.scope().cmp(b.scope()))
        });
        Self { provider, scopes, outcomes, warnings, provider_errors: Vec::new() }
    }

    pub fn with_provider_errors(mut self, errors: Vec<ProviderFailure>) -> Self {
        self.provider_errors = errors;
        self
    }

    pub fn successes(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.outcomes.iter().filter_map(ProbeOutcome::record)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProbeFailure> {
        self.outcomes.iter().filter_map(ProbeOutcome::failure_info)
    }

    /// Sum of successful counts. Failures never contribute.
    pub fn total_count(&self) -> u64 {
        self.successes().fold(0, |acc, r| acc.saturating_add(r.count))
    }

    /// Probe failures plus provider-level errors.
    pub fn error_count(&self) -> usize {
        self.failures().count() + self.provider_errors.len()
    }

    /// Provider warnings followed by per-record notes, each prefixed with its origin.
    pub fn all_warnings(&self) -> Vec<String> {
        let mut out = self.warnings.clone();
        for record in self.successes() {
            for note in &record.notes {
                out.push(format!("{} in {}: {}", record.resource_type, record.scope, note));
            }
        }
        out
    }

    /// Successful records grouped by resource type, in sorted order.
    pub fn by_resource(&self) -> Vec<ResourceTotal> {
        let mut grouped: BTreeMap<&str, ResourceTotal> = BTreeMap::new();
        for record in self.successes() {
            let entry = grouped
                .entry(record.resource_type.as_str())
                .or_insert_with(|| ResourceTotal {
                    resource_type: record.resource_type.clone(),
                    count: 0,
                    regions: BTreeMap::new(),
                });
            entry.count = entry.count.saturating_add(record.count);
            let per_scope = entry.regions.entry(record.scope.clone()).or_insert(0);
            *per_scope = per_scope.saturating_add(record.count);
        }
        grouped.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CensusError;
    use crate::models::scope::ScopeOrigin;

    fn record(resource_type: &str, scope: &str, count: u64) -> ProbeOutcome {
        ProbeOutcome::Success(ResourceRecord {
            count,
            ..ResourceRecord::empty(Provider::Aws, resource_type, scope)
        })
    }

    fn summary(outcomes: Vec<ProbeOutcome>) -> ProviderSummary {
        ProviderSummary::new(
            Provider::Aws,
            ScopeSet::new(ScopeOrigin::Explicit, ["us-east-1", "us-west-2"]),
            outcomes,
            Vec::new(),
        )
    }

    #[test]
    fn test_total_counts_only_successes() {
        let s = summary(vec![
            record("EC2Instances", "us-east-1", 25),
            record("EC2Instances", "us-west-2", 17),
            ProbeOutcome::failure(
                Provider::Aws,
                "LambdaFunctions",
                "us-east-1",
                &CensusError::Permission("denied".into()),
            ),
        ]);
        assert_eq!(s.total_count(), 42);
        assert_eq!(s.error_count(), 1);
        assert_eq!(s.total_count(), s.successes().map(|r| r.count).sum::<u64>());
    }

    #[test]
    fn test_outcomes_sorted_by_type_then_scope() {
        let s = summary(vec![
            record("LambdaFunctions", "us-west-2", 1),
            record("EC2Instances", "us-west-2", 2),
            record("EC2Instances", "us-east-1", 3),
        ]);
        let keys: Vec<(&str, &str)> = s.outcomes.iter().map(|o| (o.resource_type(), o.scope())).collect();
        assert_eq!(
            keys,
            vec![
                ("EC2Instances", "us-east-1"),
                ("EC2Instances", "us-west-2"),
                ("LambdaFunctions", "us-west-2"),
            ]
        );
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let s = summary(vec![
            record("EKSNodes", "us-east-1", u64::MAX),
            record("EKSNodes", "us-west-2", 1),
        ]);
        assert_eq!(s.total_count(), u64::MAX);
        assert_eq!(s.by_resource()[0].count, u64::MAX);
    }

    #[test]
    fn test_empty_summary_is_valid() {
        let s = summary(Vec::new());
        assert_eq!(s.total_count(), 0);
        assert_eq!(s.error_count(), 0);
        assert!(s.by_resource().is_empty());
    }

    #[test]
    fn test_by_resource_rollup() {
        let s = summary(vec![
            record("EC2Instances", "us-east-1", 25),
            record("EC2Instances", "us-west-2", 17),
            record("EKSNodes", "us-east-1", 0),
        ]);
        let totals = s.by_resource();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].resource_type, "EC2Instances");
        assert_eq!(totals[0].count, 42);
        assert_eq!(totals[0].regions["us-west-2"], 17);
        assert_eq!(totals[1].count, 0);
    }

    #[test]
    fn test_all_warnings_includes_record_notes() {
        let mut rec = ResourceRecord::empty(Provider::Aws, "EC2Instances", "us-east-1");
        rec.notes.push("listing stopped after 2 page(s)".into());
        let s = ProviderSummary::new(
            Provider::Aws,
            ScopeSet::new(ScopeOrigin::Fallback, ["us-east-1"]),
            vec![ProbeOutcome::Success(rec)],
            vec!["region discovery failed".into()],
        );
        let warnings = s.all_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[1].starts_with("EC2Instances in us-east-1"));
    }
}

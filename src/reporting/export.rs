use std::path::Path;

use chrono::{DateTime, Utc};
use csv::Writer;
use serde::Serialize;
use tracing::info;

use crate::errors::CensusError;
use crate::models::{MultiCloudReport, Provider, ProviderResult, ReportError, ResourceTotal};

/// JSON shape of one provider.
#[derive(Debug, Serialize)]
pub struct ProviderDocument {
    pub provider: Provider,
    pub status: &'static str,
    pub resources: Vec<ResourceTotal>,
    pub total: u64,
    pub errors: Vec<ReportError>,
    pub warnings: Vec<String>,
    pub scopes: Vec<String>,
}

/// JSON shape of a multi-provider run.
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub generator: String,
    pub providers: Vec<ProviderDocument>,
    pub grand_total: u64,
    pub errors: Vec<ReportError>,
    pub warnings: Vec<String>,
}

impl ProviderDocument {
    pub fn from_result(result: &ProviderResult) -> Self {
        match result {
            ProviderResult::Completed(summary) => Self {
                provider: summary.provider,
                status: "completed",
                resources: summary.by_resource(),
                total: summary.total_count(),
                errors: result.errors(),
                warnings: summary.all_warnings(),
                scopes: summary.scopes.as_slice().to_vec(),
            },
            ProviderResult::Failed(failure) => Self {
                provider: failure.provider,
                status: "failed",
                resources: Vec::new(),
                total: 0,
                errors: result.errors(),
                warnings: Vec::new(),
                scopes: Vec::new(),
            },
        }
    }
}

impl ReportDocument {
    pub fn from_report(report: &MultiCloudReport) -> Self {
        Self {
            run_id: report.run_id.clone(),
            generated_at: report.generated_at,
            generator: report.generator.clone(),
            providers: report.providers.iter().map(ProviderDocument::from_result).collect(),
            grand_total: report.grand_total(),
            errors: report.errors(),
            warnings: report.warnings(),
        }
    }
}

/// Pretty JSON. A single-provider report uses the flat provider shape.
pub fn to_json(report: &MultiCloudReport) -> Result<String, CensusError> {
    let json = match report.providers.as_slice() {
        [only] => serde_json::to_string_pretty(&ProviderDocument::from_result(only))?,
        _ => serde_json::to_string_pretty(&ReportDocument::from_report(report))?,
    };
    Ok(json)
}

/// One row per successful record; failures have no row.
pub fn to_csv(report: &MultiCloudReport) -> Result<String, CensusError> {
    let mut wtr = Writer::from_writer(vec![]);
    wtr.write_record(["provider", "resource_type", "scope", "count"])?;

    for summary in report.providers.iter().filter_map(ProviderResult::summary) {
        for record in summary.successes() {
            wtr.write_record([
                record.provider.as_str(),
                record.resource_type.as_str(),
                record.scope.as_str(),
                record.count.to_string().as_str(),
            ])?;
        }
    }

    let data = wtr
        .into_inner()
        .map_err(|e| CensusError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(data).map_err(|e| CensusError::Internal(format!("UTF-8 conversion error: {}", e)))
}

/// Write `contents` to `path`, creating parent directories.
pub async fn write_output(path: &Path, contents: &str) -> Result<(), CensusError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, contents).await?;
    info!(path = %path.display(), bytes = contents.len(), "Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, CensusError};
    use crate::models::{ProbeOutcome, ProviderFailure, ProviderSummary, ResourceRecord, ScopeOrigin, ScopeSet};

    fn record(resource_type: &str, scope: &str, count: u64) -> ProbeOutcome {
        ProbeOutcome::Success(ResourceRecord { count, ..ResourceRecord::empty(Provider::Aws, resource_type, scope) })
    }

    fn aws_report() -> MultiCloudReport {
        let summary = ProviderSummary::new(
            Provider::Aws,
            ScopeSet::new(ScopeOrigin::Explicit, ["us-east-1", "us-west-2"]),
            vec![
                record("EC2Instances", "us-east-1", 25),
                record("EC2Instances", "us-west-2", 17),
                ProbeOutcome::failure(
                    Provider::Aws,
                    "LambdaFunctions",
                    "us-west-2",
                    &CensusError::Permission("denied".into()),
                ),
            ],
            Vec::new(),
        );
        MultiCloudReport::new(vec![ProviderResult::Completed(summary)])
    }

    #[test]
    fn test_single_provider_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&aws_report()).unwrap()).unwrap();
        assert_eq!(json["provider"], "AWS");
        assert_eq!(json["total"], 42);
        assert_eq!(json["resources"][0]["type"], "EC2Instances");
        assert_eq!(json["resources"][0]["regions"]["us-east-1"], 25);
        assert_eq!(json["errors"][0]["kind"], "PermissionError");
        assert_eq!(json["errors"][0]["scope"], "us-west-2");
    }

    #[test]
    fn test_multi_provider_json_has_grand_total() {
        let mut report = aws_report();
        report.providers.push(ProviderResult::Failed(ProviderFailure {
            provider: Provider::Azure,
            kind: ErrorKind::ProviderSetup,
            message: "no credentials".into(),
        }));
        let json: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        assert_eq!(json["grand_total"], 42);
        assert_eq!(json["providers"][1]["status"], "failed");
        assert_eq!(json["errors"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_csv_rows_only_for_successes() {
        let csv = to_csv(&aws_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "provider,resource_type,scope,count");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "AWS,EC2Instances,us-east-1,25");
    }
}

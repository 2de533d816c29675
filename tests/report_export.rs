use cloudcensus::cli::count::emit_report;
use cloudcensus::config::OutputFormat;
use cloudcensus::errors::{CensusError, ErrorKind};
use cloudcensus::models::{
    MultiCloudReport, ProbeOutcome, Provider, ProviderFailure, ProviderResult, ProviderSummary,
    ResourceRecord, ScopeOrigin, ScopeSet,
};
use cloudcensus::reporting::{to_csv, to_json, write_output};
use std::fs;
use tempfile::TempDir;

fn success(provider: Provider, resource_type: &str, scope: &str, count: u64) -> ProbeOutcome {
    ProbeOutcome::Success(ResourceRecord { count, ..ResourceRecord::empty(provider, resource_type, scope) })
}

fn make_report() -> MultiCloudReport {
    let aws = ProviderSummary::new(
        Provider::Aws,
        ScopeSet::new(ScopeOrigin::Discovered, ["us-east-1", "us-west-2"]),
        vec![
            success(Provider::Aws, "EC2Instances", "us-east-1", 25),
            success(Provider::Aws, "EC2Instances", "us-west-2", 17),
            success(Provider::Aws, "LambdaFunctions", "us-east-1", 156),
            ProbeOutcome::failure(
                Provider::Aws,
                "EKSNodes",
                "us-west-2",
                &CensusError::Throttle("Rate exceeded".into()),
            ),
        ],
        vec!["region discovery failed: denied; using fallback regions: us-east-1".into()],
    );
    let gcp = ProviderSummary::new(
        Provider::Gcp,
        ScopeSet::new(ScopeOrigin::Explicit, ["proj-a"]),
        vec![success(Provider::Gcp, "GKENodes", "proj-a", 6)],
        Vec::new(),
    );
    MultiCloudReport::new(vec![
        ProviderResult::Completed(gcp),
        ProviderResult::Failed(ProviderFailure {
            provider: Provider::Azure,
            kind: ErrorKind::Auth,
            message: "no subscription access".into(),
        }),
        ProviderResult::Completed(aws),
    ])
}

#[test]
fn test_multi_cloud_json_document() {
    let report = make_report();
    let json: serde_json::Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();

    assert_eq!(json["run_id"], report.run_id.as_str());
    assert_eq!(json["grand_total"], 204);
    assert!(json["generator"].as_str().unwrap().starts_with("cloudcensus "));

    let providers = json["providers"].as_array().unwrap();
    let names: Vec<&str> = providers.iter().map(|p| p["provider"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["AWS", "Azure", "GCP"]);
    assert_eq!(providers[0]["total"], 198);
    assert_eq!(providers[0]["resources"][0]["type"], "EC2Instances");
    assert_eq!(providers[0]["resources"][0]["regions"]["us-west-2"], 17);
    assert_eq!(providers[0]["scopes"].as_array().unwrap().len(), 2);
    assert_eq!(providers[0]["warnings"].as_array().unwrap().len(), 1);
    assert_eq!(providers[1]["status"], "failed");

    let errors = json["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["kind"], "ThrottleError");
    assert_eq!(errors[0]["resource_type"], "EKSNodes");
    assert_eq!(errors[1]["kind"], "AuthError");
    assert!(errors[1].get("scope").is_none());
}

#[test]
fn test_csv_flattens_successful_records() {
    let csv = to_csv(&make_report()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "provider,resource_type,scope,count",
            "AWS,EC2Instances,us-east-1,25",
            "AWS,EC2Instances,us-west-2,17",
            "AWS,LambdaFunctions,us-east-1,156",
            "GCP,GKENodes,proj-a,6",
        ]
    );
}

#[tokio::test]
async fn test_write_output_creates_parent_directories() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("reports").join("nested").join("inventory.json");

    write_output(&path, "{}\n").await.unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
}

#[tokio::test]
async fn test_emit_report_infers_csv_from_extension() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("inventory.csv");

    emit_report(&make_report(), OutputFormat::Table, Some(&path), true).await.unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("provider,resource_type,scope,count\n"));
}

#[tokio::test]
async fn test_emit_report_json_to_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("inventory.out");

    emit_report(&make_report(), OutputFormat::Json, Some(&path), true).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["grand_total"], 204);
}

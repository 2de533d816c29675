use cloudcensus::config::{parse_config, OutputFormat};
use cloudcensus::errors::CensusError;
use cloudcensus::models::Provider;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_full_config_file() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(
        &tmp,
        "census.yaml",
        r#"
run:
  concurrency: 6
  timeout_secs: 300
retry:
  max_attempts: 4
  base_delay_ms: 250
  max_delay_ms: 5000
  jitter_ms: 50
aws:
  regions: [us-east-1, us-west-2]
  resources: [ec2, eks]
azure:
  subscriptions: [00000000-0000-0000-0000-000000000001]
gcp:
  projects: [proj-a]
  resources: [gke, cloud_run]
output:
  format: csv
  path: out/inventory.csv
"#,
    );

    let config = parse_config(&path).await.unwrap();
    let settings = config.run_settings();
    assert_eq!(settings.concurrency, 6);
    assert_eq!(settings.timeout, Some(Duration::from_secs(300)));
    assert_eq!(settings.retry.max_attempts, 4);
    assert_eq!(settings.retry.base_delay, Duration::from_millis(250));
    assert_eq!(settings.retry.jitter, Duration::from_millis(50));
    assert_eq!(config.scopes_for(Provider::Aws).len(), 2);
    assert_eq!(config.scopes_for(Provider::Azure).len(), 1);
    assert_eq!(config.resources_for(Provider::Gcp), Some(vec!["gke".to_string(), "cloud_run".to_string()]));
    let output = config.output.unwrap();
    assert_eq!(output.format, Some(OutputFormat::Csv));
}

#[tokio::test]
async fn test_missing_file_is_config_error() {
    let tmp = TempDir::new().unwrap();
    let err = parse_config(&tmp.path().join("absent.yaml")).await.unwrap_err();
    assert!(matches!(err, CensusError::Config(_)));
}

#[tokio::test]
async fn test_oversized_file_rejected() {
    let tmp = TempDir::new().unwrap();
    let mut content = String::from("aws:\n  regions:\n");
    while content.len() <= 1_048_576 {
        content.push_str("    - us-east-1\n");
    }
    let path = write_config(&tmp, "huge.yaml", &content);
    let err = parse_config(&path).await.unwrap_err();
    assert!(err.to_string().contains("1MB"));
}

#[tokio::test]
async fn test_inline_credentials_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(&tmp, "creds.yaml", "aws:\n  aws_secret_access_key: abc123\n");
    let err = parse_config(&path).await.unwrap_err();
    assert!(matches!(err, CensusError::Config(_)));
}

#[tokio::test]
async fn test_unknown_resource_tag_rejected() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(&tmp, "tags.yaml", "azure:\n  resources: [vms, lambda]\n");
    let err = parse_config(&path).await.unwrap_err();
    assert!(err.to_string().contains("lambda"));
}

#[tokio::test]
async fn test_wrong_type_is_config_error() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(&tmp, "bad.yaml", "run:\n  concurrency: lots\n");
    let err = parse_config(&path).await.unwrap_err();
    assert!(matches!(err, CensusError::Config(_)));
}

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::{CrossProviderAggregator, ProviderRequest, RunSettings};
use crate::backend::{ClientFactory, Snapshot, SnapshotFactory, UnlinkedFactory};
use crate::cli::commands::RunArgs;
use crate::config::{self, CensusConfig, OutputFormat};
use crate::errors::CensusError;
use crate::models::{MultiCloudReport, Provider};
use crate::probes::catalog;
use crate::reporting::{render_table, to_csv, to_json, write_output};

/// One provider named on the command line, with any explicit scopes.
#[derive(Debug, Clone)]
pub struct Target {
    pub provider: Provider,
    pub scopes: Vec<String>,
}

impl Target {
    pub fn new(provider: Provider, scopes: Vec<String>) -> Self {
        Self { provider, scopes }
    }
}

/// Run a count over `targets` and emit the report. Returns the process exit code.
pub async fn handle_count(targets: Vec<Target>, args: RunArgs, quiet: bool) -> Result<i32, CensusError> {
    let file_config = match &args.config {
        Some(path) => config::parse_config(path).await?,
        None => CensusConfig::default(),
    };

    let settings = build_run_settings(&args, &file_config)?;
    let requests = build_requests(&targets, &args, &file_config)?;
    let factory = build_factory(args.snapshot.as_deref()).await?;

    info!(
        providers = ?requests.iter().map(|r| r.provider.key()).collect::<Vec<_>>(),
        concurrency = settings.concurrency,
        timeout_secs = settings.timeout.map(|t| t.as_secs()),
        "Starting inventory"
    );

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let token = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, abandoning in-flight probes");
                token.cancel();
            }
        })
    };

    let aggregator = CrossProviderAggregator::new(factory, settings).with_cancel_token(cancel);
    let report = aggregator.run_all(requests).await;
    ctrl_c.abort();

    let format = args
        .format
        .or_else(|| file_config.output.as_ref().and_then(|o| o.format))
        .unwrap_or_default();
    let path = args
        .output
        .clone()
        .or_else(|| file_config.output.as_ref().and_then(|o| o.path.clone()).map(PathBuf::from));

    emit_report(&report, format, path.as_deref(), quiet).await?;
    Ok(report.exit_code())
}

/// Defaults, then config file, then command-line flags.
pub fn build_run_settings(args: &RunArgs, file_config: &CensusConfig) -> Result<RunSettings, CensusError> {
    let mut settings = file_config.run_settings();

    if let Some(n) = args.concurrency {
        if n == 0 {
            return Err(CensusError::Config("--concurrency must be at least 1".into()));
        }
        settings.concurrency = n;
    }
    if let Some(secs) = args.timeout {
        if secs == 0 {
            return Err(CensusError::Config("--timeout must be at least 1 second".into()));
        }
        settings.timeout = Some(Duration::from_secs(secs));
    }
    if let Some(n) = args.max_attempts {
        if n == 0 {
            return Err(CensusError::Config("--max-attempts must be at least 1".into()));
        }
        settings.retry.max_attempts = n;
    }

    Ok(settings)
}

/// Resolve scopes and resource filters per target. A single-provider run rejects tags
/// that provider does not have; a multi-provider run only rejects tags no provider has
/// and skips providers the filter leaves with nothing to count.
pub fn build_requests(
    targets: &[Target],
    args: &RunArgs,
    file_config: &CensusConfig,
) -> Result<Vec<ProviderRequest>, CensusError> {
    if let Some(tags) = &args.resources {
        if targets.len() == 1 {
            config::validate_resource_tags(targets[0].provider, tags)?;
        } else if let Some(unknown) = tags
            .iter()
            .find(|t| targets.iter().all(|target| catalog::find(target.provider, t.trim()).is_none()))
        {
            return Err(CensusError::Config(format!(
                "Unknown resource '{}' for the selected providers",
                unknown
            )));
        }
    }

    let mut requests = Vec::new();
    for target in targets {
        let scopes = if target.scopes.is_empty() {
            file_config.scopes_for(target.provider)
        } else {
            target.scopes.clone()
        };
        let resources = args
            .resources
            .clone()
            .or_else(|| file_config.resources_for(target.provider));

        if let Some(tags) = &resources {
            if catalog::select(target.provider, Some(tags)).is_empty() {
                debug!(provider = %target.provider, "Resource filter selects nothing, skipping provider");
                continue;
            }
        }

        requests.push(
            ProviderRequest::new(target.provider)
                .with_scopes(scopes)
                .with_resources(resources),
        );
    }
    Ok(requests)
}

async fn build_factory(snapshot: Option<&Path>) -> Result<Arc<dyn ClientFactory>, CensusError> {
    match snapshot {
        Some(path) => {
            let snapshot = Snapshot::load(path).await?;
            info!(path = %path.display(), "Replaying provider snapshot");
            Ok(Arc::new(SnapshotFactory::new(snapshot)))
        }
        None => Ok(Arc::new(UnlinkedFactory)),
    }
}

fn render_document(report: &MultiCloudReport, format: OutputFormat) -> Result<String, CensusError> {
    match format {
        OutputFormat::Csv => to_csv(report),
        OutputFormat::Json | OutputFormat::Table => to_json(report),
    }
}

/// The table goes to stdout unless a machine format is requested without a file, in
/// which case the document itself is printed.
pub async fn emit_report(
    report: &MultiCloudReport,
    format: OutputFormat,
    path: Option<&Path>,
    quiet: bool,
) -> Result<(), CensusError> {
    match (format, path) {
        (OutputFormat::Json | OutputFormat::Csv, None) => {
            print!("{}", ensure_newline(render_document(report, format)?));
        }
        (_, Some(path)) => {
            if !quiet {
                print!("{}", render_table(report));
            }
            let format = match format {
                OutputFormat::Table => infer_format(path),
                other => other,
            };
            write_output(path, &ensure_newline(render_document(report, format)?)).await?;
            if !quiet {
                println!(
                    "{}",
                    style(format!("Report exported to {} ({})", path.display(), format)).green()
                );
            }
        }
        (OutputFormat::Table, None) => {
            if !quiet {
                print!("{}", render_table(report));
            }
        }
    }
    Ok(())
}

fn infer_format(path: &Path) -> OutputFormat {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => OutputFormat::Csv,
        _ => OutputFormat::Json,
    }
}

fn ensure_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;

    fn all_targets() -> Vec<Target> {
        Provider::ALL.iter().map(|p| Target::new(*p, Vec::new())).collect()
    }

    #[test]
    fn test_cli_flags_override_config() {
        let file_config = CensusConfig {
            run: Some(RunConfig { concurrency: Some(4), timeout_secs: Some(60) }),
            ..Default::default()
        };
        let args = RunArgs { concurrency: Some(2), ..Default::default() };
        let settings = build_run_settings(&args, &file_config).unwrap();
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let args = RunArgs { max_attempts: Some(0), ..Default::default() };
        assert!(matches!(
            build_run_settings(&args, &CensusConfig::default()),
            Err(CensusError::Config(_))
        ));
    }

    #[test]
    fn test_single_provider_rejects_foreign_tag() {
        let args = RunArgs { resources: Some(vec!["gke".into()]), ..Default::default() };
        let targets = vec![Target::new(Provider::Aws, Vec::new())];
        assert!(build_requests(&targets, &args, &CensusConfig::default()).is_err());
    }

    #[test]
    fn test_all_skips_providers_without_matching_tags() {
        let args = RunArgs { resources: Some(vec!["ec2".into(), "gke".into()]), ..Default::default() };
        let requests = build_requests(&all_targets(), &args, &CensusConfig::default()).unwrap();
        let providers: Vec<Provider> = requests.iter().map(|r| r.provider).collect();
        assert_eq!(providers, vec![Provider::Aws, Provider::Gcp]);
    }

    #[test]
    fn test_cli_scopes_win_over_config() {
        let file_config = config::parse_config_str("aws: { regions: [eu-west-1] }").unwrap();
        let targets = vec![Target::new(Provider::Aws, vec!["us-east-1".into()])];
        let requests = build_requests(&targets, &RunArgs::default(), &file_config).unwrap();
        assert_eq!(requests[0].explicit_scopes, vec!["us-east-1".to_string()]);

        let targets = vec![Target::new(Provider::Aws, Vec::new())];
        let requests = build_requests(&targets, &RunArgs::default(), &file_config).unwrap();
        assert_eq!(requests[0].explicit_scopes, vec!["eu-west-1".to_string()]);
    }

    #[test]
    fn test_infer_format_from_extension() {
        assert_eq!(infer_format(Path::new("out/report.CSV")), OutputFormat::Csv);
        assert_eq!(infer_format(Path::new("report.json")), OutputFormat::Json);
        assert_eq!(infer_format(Path::new("report")), OutputFormat::Json);
    }
}

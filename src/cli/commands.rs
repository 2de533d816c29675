use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;
use crate::models::Provider;

#[derive(Parser)]
#[command(
    name = "cloudcensus",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIMESTAMP"), ")"),
    about = "Count compute nodes across AWS, Azure and GCP"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress the summary table and export messages
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count AWS compute resources
    Aws(AwsArgs),
    /// Count Azure compute resources
    Azure(AzureArgs),
    /// Count GCP compute resources
    Gcp(GcpArgs),
    /// Count across every provider
    All(AllArgs),
    /// List the resource types that can be counted
    Resources(ResourcesArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Options shared by every counting command.
#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Comma-separated resource tags to count (see `resources`)
    #[arg(long, value_delimiter = ',')]
    pub resources: Option<Vec<String>>,

    /// Write the report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replay provider responses from a recorded snapshot file
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Abandon unfinished probes after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum probes in flight per provider
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Attempts per remote call, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

#[derive(Args, Clone, Debug)]
pub struct AwsArgs {
    /// Comma-separated regions (default: discover)
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Clone, Debug)]
pub struct AzureArgs {
    /// Comma-separated subscription IDs (default: discover)
    #[arg(long = "subscription-id", value_delimiter = ',')]
    pub subscription_id: Vec<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Clone, Debug)]
pub struct GcpArgs {
    /// Comma-separated project IDs (default: discover)
    #[arg(long, value_delimiter = ',')]
    pub project: Vec<String>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Clone, Debug)]
pub struct AllArgs {
    /// Comma-separated AWS regions
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Comma-separated Azure subscription IDs
    #[arg(long = "subscription-id", value_delimiter = ',')]
    pub subscription_id: Vec<String>,

    /// Comma-separated GCP project IDs
    #[arg(long, value_delimiter = ',')]
    pub project: Vec<String>,

    /// Comma-separated providers to include (default: all)
    #[arg(long, value_delimiter = ',')]
    pub providers: Option<Vec<Provider>>,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Clone, Debug)]
pub struct ResourcesArgs {
    /// Only list this provider's resource types
    #[arg(long)]
    pub provider: Option<Provider>,
}

#[derive(Args, Clone, Debug)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aws_with_regions_and_resources() {
        let cli = Cli::try_parse_from([
            "cloudcensus", "-vv", "aws", "--regions", "us-east-1,eu-west-1", "--resources", "ec2,lambda",
            "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Aws(args) = cli.command else { panic!("expected aws") };
        assert_eq!(args.regions, vec!["us-east-1", "eu-west-1"]);
        assert_eq!(args.run.resources, Some(vec!["ec2".to_string(), "lambda".to_string()]));
        assert_eq!(args.run.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_parse_all_with_every_scope_flag() {
        let cli = Cli::try_parse_from([
            "cloudcensus", "all", "--regions", "us-east-1", "--subscription-id", "sub-1",
            "--project", "proj-a,proj-b", "--providers", "aws,gcp", "--timeout", "30",
        ])
        .unwrap();
        let Commands::All(args) = cli.command else { panic!("expected all") };
        assert_eq!(args.project.len(), 2);
        assert_eq!(args.providers, Some(vec![Provider::Aws, Provider::Gcp]));
        assert_eq!(args.run.timeout, Some(30));
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["cloudcensus", "gcp", "--format", "xml"]).is_err());
    }
}

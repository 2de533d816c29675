use clap::Parser;
use cloudcensus::cli::{self, count::Target, Commands};
use cloudcensus::errors::CensusError;
use cloudcensus::models::Provider;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    // Logs go to stderr so stdout carries only the report.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.with_ansi(!cli.no_color).init();
    }

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let quiet = cli.quiet;
    let result = match cli.command {
        Commands::Aws(args) => {
            cli::count::handle_count(vec![Target::new(Provider::Aws, args.regions)], args.run, quiet).await
        }
        Commands::Azure(args) => {
            cli::count::handle_count(vec![Target::new(Provider::Azure, args.subscription_id)], args.run, quiet).await
        }
        Commands::Gcp(args) => {
            cli::count::handle_count(vec![Target::new(Provider::Gcp, args.project)], args.run, quiet).await
        }
        Commands::All(args) => {
            let selected = args.providers.unwrap_or_else(|| Provider::ALL.to_vec());
            let targets = Provider::ALL
                .into_iter()
                .filter(|p| selected.contains(p))
                .map(|p| {
                    let scopes = match p {
                        Provider::Aws => args.regions.clone(),
                        Provider::Azure => args.subscription_id.clone(),
                        Provider::Gcp => args.project.clone(),
                    };
                    Target::new(p, scopes)
                })
                .collect();
            cli::count::handle_count(targets, args.run, quiet).await
        }
        Commands::Resources(args) => {
            cli::resources::handle_resources(args);
            Ok(0)
        }
        Commands::Validate(args) => cli::validate::handle_validate(args).await.map(|()| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            let exit_code = match &e {
                CensusError::Config(_) | CensusError::Yaml(_) => 2,
                CensusError::Io(_) | CensusError::Json(_) | CensusError::Csv(_) => 3,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }
}

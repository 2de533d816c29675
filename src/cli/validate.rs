use crate::cli::commands::ValidateArgs;
use crate::config;
use crate::errors::CensusError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), CensusError> {
    let config = config::parse_config(&args.config).await?;
    let settings = config.run_settings();
    println!("Configuration is valid: {}", args.config.display());
    println!(
        "  concurrency={} timeout={} max_attempts={}",
        settings.concurrency,
        settings
            .timeout
            .map(|t| format!("{}s", t.as_secs()))
            .unwrap_or_else(|| "none".to_string()),
        settings.retry.max_attempts
    );
    Ok(())
}

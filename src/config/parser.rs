use std::path::Path;
use crate::errors::CensusError;
use crate::models::Provider;
use crate::probes::catalog;
use super::types::CensusConfig;
use super::security::reject_inline_secrets;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<CensusConfig, CensusError> {
    if !path.exists() {
        return Err(CensusError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(CensusError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Parse and validate config text. An empty document is the default config.
pub fn parse_config_str(content: &str) -> Result<CensusConfig, CensusError> {
    if content.trim().is_empty() {
        return Ok(CensusConfig::default());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| CensusError::Config(format!("Invalid YAML: {}", e)))?;

    reject_inline_secrets(&yaml)?;

    for msg in schema_warnings(&yaml)? {
        warn!(validation_error = %msg, "Config schema warning");
    }

    let config: CensusConfig = serde_yaml::from_value(yaml)
        .map_err(|e| CensusError::Config(format!("Invalid config: {}", e)))?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Structural problems reported by the JSON schema. Advisory: the typed parse and
/// [`validate_conflicts`] decide whether the config is usable.
pub fn schema_warnings(yaml: &serde_yaml::Value) -> Result<Vec<String>, CensusError> {
    let json_value: serde_json::Value = serde_json::to_value(yaml)
        .map_err(|e| CensusError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| CensusError::Config(format!("Schema compilation error: {}", e)))?;

    let messages = match compiled.validate(&json_value) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect(),
    };
    Ok(messages)
}

/// Semantic checks the schema cannot express.
pub fn validate_conflicts(config: &CensusConfig) -> Result<(), CensusError> {
    if let Some(run) = &config.run {
        if run.concurrency == Some(0) {
            return Err(CensusError::Config("run.concurrency must be at least 1".into()));
        }
        if run.timeout_secs == Some(0) {
            return Err(CensusError::Config("run.timeout_secs must be at least 1".into()));
        }
    }

    if let Some(retry) = &config.retry {
        if retry.max_attempts == Some(0) {
            return Err(CensusError::Config("retry.max_attempts must be at least 1".into()));
        }
    }
    let policy = config.retry_policy();
    if policy.base_delay > policy.max_delay {
        return Err(CensusError::Config(format!(
            "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
            policy.base_delay.as_millis(),
            policy.max_delay.as_millis()
        )));
    }

    for provider in Provider::ALL {
        if let Some(tags) = config.resources_for(provider) {
            validate_resource_tags(provider, &tags)?;
        }
    }

    Ok(())
}

/// Every tag must name a catalog entry of `provider`.
pub fn validate_resource_tags(provider: Provider, tags: &[String]) -> Result<(), CensusError> {
    for tag in tags {
        if catalog::find(provider, tag.trim()).is_none() {
            let known: Vec<&str> = catalog::kinds_for(provider).map(|k| k.tag).collect();
            return Err(CensusError::Config(format!(
                "Unknown {} resource '{}' (expected one of: {})",
                provider.key(),
                tag,
                known.join(", ")
            )));
        }
    }
    Ok(())
}

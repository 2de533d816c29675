use thiserror::Error;

#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Throttled: {0}")]
    Throttle(String),

    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Region discovery failed: {0}")]
    RegionDiscovery(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Provider setup failed: {0}")]
    ProviderSetup(String),

    #[error("Provider API error {code}: {message}")]
    Api { code: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CensusError {
    /// True when the provider reported the service, region or account as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CensusError::NotFound(_))
    }
}

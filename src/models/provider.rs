use serde::{Deserialize, Serialize};

/// Cloud provider. Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "Azure")]
    Azure,
    #[serde(rename = "GCP")]
    Gcp,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "AWS",
            Self::Azure => "Azure",
            Self::Gcp => "GCP",
        }
    }

    /// Lowercase key used in config files and snapshots.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
        }
    }

    /// What a scope means for this provider.
    pub fn scope_label(&self) -> &'static str {
        match self {
            Self::Aws => "region",
            Self::Azure => "subscription",
            Self::Gcp => "project",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "azure" => Ok(Self::Azure),
            "gcp" | "google" => Ok(Self::Gcp),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_ordering_is_report_order() {
        let mut providers = vec![Provider::Gcp, Provider::Aws, Provider::Azure];
        providers.sort();
        assert_eq!(providers, Provider::ALL.to_vec());
    }

    #[test]
    fn test_provider_serialization() {
        assert_eq!(serde_json::to_string(&Provider::Aws).unwrap(), "\"AWS\"");
        assert_eq!(serde_json::to_string(&Provider::Gcp).unwrap(), "\"GCP\"");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("Azure".parse::<Provider>().unwrap(), Provider::Azure);
        assert!("oracle".parse::<Provider>().is_err());
    }
}

use serde::{Deserialize, Serialize};

/// Lifecycle of a single provider run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    #[default]
    Idle,
    ScopesResolving,
    ProbesDispatched,
    Collecting,
    Summarized,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ScopesResolving => write!(f, "scopes-resolving"),
            Self::ProbesDispatched => write!(f, "probes-dispatched"),
            Self::Collecting => write!(f, "collecting"),
            Self::Summarized => write!(f, "summarized"),
        }
    }
}

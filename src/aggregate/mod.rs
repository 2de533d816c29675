pub mod multi;
pub mod provider;
pub mod state;

pub use multi::{CrossProviderAggregator, ProviderRequest};
pub use provider::{ProviderAggregator, RunSettings, DEFAULT_CONCURRENCY};
pub use state::RunPhase;

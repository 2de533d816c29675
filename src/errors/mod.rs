pub mod types;
pub mod classification;
pub mod retry;

pub use types::CensusError;
pub use classification::{classify_provider_error, ErrorClassification, ErrorKind};
pub use retry::{RetryPolicy, with_retry};

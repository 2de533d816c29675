pub mod provider;
pub mod record;
pub mod scope;
pub mod summary;
pub mod report;

pub use provider::*;
pub use record::*;
pub use scope::*;
pub use summary::*;
pub use report::*;

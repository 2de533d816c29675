pub mod catalog;
pub mod listing;

pub use catalog::{find, kinds_for, label_for, select, ResourceKind, Tally, CATALOG};
pub use listing::{ListingProbe, ResourceProbe};

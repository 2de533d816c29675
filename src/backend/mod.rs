pub mod client;
pub mod snapshot;

pub use client::{ClientFactory, CloudClient, Page, UnlinkedFactory};
pub use snapshot::{ProviderSnapshot, Snapshot, SnapshotClient, SnapshotFactory};

//! Persistence implementations
//!
//! The stores live in memory; this module moves their snapshot to and from
//! disk.

mod snapshot_file;

pub use snapshot_file::SnapshotFile;

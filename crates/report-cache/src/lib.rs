//! Date-keyed store of previously built aggregate reports.
//!
//! Entries are trusted until overwritten: there is no staleness check
//! against the scan directory. Anything unreadable is a miss.

mod insert;
mod memory;
mod models;
mod open;
mod query;

pub use memory::MemoryCache;
pub use models::{CacheEnvelope, Corruption, FORMAT_TAG};
pub use open::FsCache;

use scanboard_core::{AggregateReport, DateKey};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode cache entry: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait ReportCache: Send + Sync {
    /// Cached report for exactly this key, or `None` when absent or corrupt.
    fn get(&self, date: &DateKey) -> Option<AggregateReport>;

    /// Replace any entry for the key. Readers see the old entry or the new
    /// one, never a partial write.
    fn put(&self, date: &DateKey, report: &AggregateReport) -> Result<(), CacheError>;

    /// Drop the entry for the key; absent entries are not an error.
    fn remove(&self, date: &DateKey) -> Result<(), CacheError>;
}

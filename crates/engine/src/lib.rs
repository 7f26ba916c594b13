//! Query façade over the scan aggregation pipeline: cache lookup, file
//! enumeration, parse, classify, aggregate, cache write.

mod dates;
mod query;
mod source;
pub mod views;

pub use dates::list_scan_dates;
pub use query::{now_rfc3339, Engine, QueryOutcome, ReportOrigin};
pub use source::{FsScanSource, ScanFile, ScanSource};

pub use report_cache::{CacheError, FsCache, MemoryCache, ReportCache};
pub use scanboard_core::{AggregateReport, DateKey, QueryError};

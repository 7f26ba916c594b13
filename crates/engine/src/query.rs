use crate::source::ScanSource;
use aggregator::Aggregator;
use record_parser::parse_loaded;
use report_cache::ReportCache;
use scanboard_core::keylock::KeyedLocks;
use scanboard_core::{AggregateReport, DateKey, QueryError};
use std::sync::Arc;
use std::time::Instant;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| String::new())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOrigin {
    Cache,
    Rebuilt,
}

#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub report: AggregateReport,
    pub origin: ReportOrigin,
    /// Set when a rebuilt report could not be persisted. The report itself is
    /// still valid.
    pub cache_warning: Option<String>,
}

/// Single entry point for aggregate reports.
pub struct Engine {
    source: Arc<dyn ScanSource>,
    cache: Arc<dyn ReportCache>,
    rebuilds: KeyedLocks,
}

impl Engine {
    pub fn new(source: Arc<dyn ScanSource>, cache: Arc<dyn ReportCache>) -> Self {
        Engine { source, cache, rebuilds: KeyedLocks::new() }
    }

    pub fn list_dates(&self) -> Vec<DateKey> {
        self.source.list_dates()
    }

    /// Return the report for `date`, from cache unless `force_rebuild` is set
    /// or no valid entry exists.
    pub fn query(&self, date: &str, force_rebuild: bool) -> Result<QueryOutcome, QueryError> {
        let key = DateKey::parse(date)?;
        if !self.source.dir_exists(&key) {
            return Err(QueryError::DirectoryNotFound(self.source.date_dir(&key)));
        }
        if !force_rebuild {
            if let Some(report) = self.cached(&key) {
                return Ok(report);
            }
        }
        self.rebuilds.with_lock(key.as_str(), || -> Result<QueryOutcome, QueryError> {
            // another caller may have finished the same rebuild while we waited
            if !force_rebuild {
                if let Some(report) = self.cached(&key) {
                    return Ok(report);
                }
            }
            let report = self.rebuild(&key)?;
            let cache_warning = match self.cache.put(&key, &report) {
                Ok(()) => None,
                Err(e) => {
                    warn!(date = %key, error = %e, "rebuilt report was not cached");
                    Some(e.to_string())
                }
            };
            Ok(QueryOutcome { report, origin: ReportOrigin::Rebuilt, cache_warning })
        })
    }

    fn cached(&self, key: &DateKey) -> Option<QueryOutcome> {
        let report = self.cache.get(key)?;
        debug!(date = %key, "serving cached report");
        Some(QueryOutcome { report, origin: ReportOrigin::Cache, cache_warning: None })
    }

    /// Parse every scan file of `key` and aggregate, bypassing the cache.
    pub fn rebuild(&self, key: &DateKey) -> Result<AggregateReport, QueryError> {
        let started = Instant::now();
        let files = self
            .source
            .list_scan_files(key)
            .map_err(|source| QueryError::ScanDirUnreadable { path: self.source.date_dir(key), source })?;
        let mut agg = Aggregator::new(key.as_str());
        for file in &files {
            let outcome = parse_loaded(self.source.read_file(file));
            if let Some(reason) = outcome.skip_reason() {
                debug!(date = %key, file = %file.name, %reason, "skipping scan file");
            }
            agg.push(outcome);
        }
        let report = agg.finish(now_rfc3339());
        info!(
            date = %key,
            files = report.summary.total_files,
            live_hosts = report.summary.live_hosts,
            skipped = report.summary.skipped_files,
            duration_ms = started.elapsed().as_millis() as u64,
            "rebuilt report"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FsScanSource;
    use report_cache::{CacheError, MemoryCache};
    use tempfile::TempDir;

    struct FailingCache;

    impl ReportCache for FailingCache {
        fn get(&self, _: &DateKey) -> Option<AggregateReport> {
            None
        }
        fn put(&self, _: &DateKey, _: &AggregateReport) -> Result<(), CacheError> {
            Err(CacheError::Io {
                path: "/read-only/1.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
        fn remove(&self, _: &DateKey) -> Result<(), CacheError> {
            Ok(())
        }
    }

    #[test]
    fn cache_write_failure_is_a_warning() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("1")).unwrap();
        let engine = Engine::new(Arc::new(FsScanSource::new(tmp.path())), Arc::new(FailingCache));
        let out = engine.query("1", false).unwrap();
        assert_eq!(out.origin, ReportOrigin::Rebuilt);
        assert!(out.cache_warning.unwrap().contains("read-only"));
        assert_eq!(out.report.summary.total_files, 0);
    }

    #[test]
    fn invalid_date_checked_before_filesystem() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("abc")).unwrap();
        let engine = Engine::new(Arc::new(FsScanSource::new(tmp.path())), Arc::new(MemoryCache::new()));
        assert!(matches!(engine.query("abc", false), Err(QueryError::InvalidDate(_))));
        assert!(matches!(engine.query("", true), Err(QueryError::InvalidDate(_))));
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let ts = now_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'), "{ts}");
    }
}

use crate::{CacheEnvelope, CacheError, Corruption, FsCache, ReportCache};
use scanboard_core::{AggregateReport, DateKey};
use std::io::ErrorKind;
use tracing::warn;

impl FsCache {
    /// Like [`ReportCache::get`], but says why an existing entry was rejected.
    /// `Ok(None)` means no entry exists.
    pub fn load_entry(&self, date: &DateKey) -> Result<Option<AggregateReport>, Corruption> {
        let bytes = match std::fs::read(self.entry_path(date)) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Corruption::Io(e)),
        };
        CacheEnvelope::open(date, &bytes).map(Some)
    }

    /// Keys with an entry file, most recent first. Temp files and names that
    /// are not date keys are ignored.
    pub fn entries(&self) -> Result<Vec<DateKey>, CacheError> {
        let rd = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(CacheError::Io { path: self.dir.clone(), source }),
        };
        let mut keys: Vec<DateKey> = rd
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.strip_suffix(".json").and_then(|stem| DateKey::parse(stem).ok())
            })
            .collect();
        keys.sort_by(|a, b| b.as_str().cmp(a.as_str()));
        Ok(keys)
    }
}

impl ReportCache for FsCache {
    fn get(&self, date: &DateKey) -> Option<AggregateReport> {
        match self.load_entry(date) {
            Ok(found) => found,
            Err(reason) => {
                warn!(date = %date, path = %self.entry_path(date).display(), %reason, "corrupt cache entry, treating as miss");
                None
            }
        }
    }

    fn put(&self, date: &DateKey, report: &AggregateReport) -> Result<(), CacheError> {
        self.write_entry(date, report)
    }

    fn remove(&self, date: &DateKey) -> Result<(), CacheError> {
        self.remove_entry(date)
    }
}

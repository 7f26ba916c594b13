use crate::{CacheEnvelope, CacheError, FsCache};
use scanboard_core::{AggregateReport, DateKey};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

impl FsCache {
    /// Serialize, write to a temp file in the cache directory, fsync, then
    /// rename over the entry. Same-key writers take turns.
    pub fn write_entry(&self, date: &DateKey, report: &AggregateReport) -> Result<(), CacheError> {
        let body = serde_json::to_vec_pretty(&CacheEnvelope::seal(date, report)?)?;
        self.locks.with_lock(date.as_str(), || -> Result<(), CacheError> {
            self.ensure_dir()?;
            let target = self.entry_path(date);
            let tmp = self.dir.join(format!(".{}.{}.tmp", date, Uuid::now_v7()));
            if let Err(source) = publish(&tmp, &target, &body) {
                let _ = fs::remove_file(&tmp);
                return Err(CacheError::Io { path: target, source });
            }
            debug!(date = %date, path = %target.display(), bytes = body.len(), "cache entry written");
            Ok(())
        })
    }

    pub fn remove_entry(&self, date: &DateKey) -> Result<(), CacheError> {
        let path = self.entry_path(date);
        self.locks.with_lock(date.as_str(), || match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io { path: path.clone(), source }),
        })
    }
}

fn publish(tmp: &Path, target: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(body)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, target)
}

use crate::CacheError;
use scanboard_core::keylock::KeyedLocks;
use scanboard_core::DateKey;
use std::path::{Path, PathBuf};

/// Directory-of-files cache: one `<date>.json` per key.
pub struct FsCache {
    pub(crate) dir: PathBuf,
    pub(crate) locks: KeyedLocks,
}

impl FsCache {
    /// Use `dir` as the cache location. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsCache { dir: dir.into(), locks: KeyedLocks::new() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, date: &DateKey) -> PathBuf {
        self.dir.join(format!("{}.json", date))
    }

    pub(crate) fn ensure_dir(&self) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io { path: self.dir.clone(), source })
    }
}

use crate::{CacheError, ReportCache};
use scanboard_core::{AggregateReport, DateKey};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// In-process cache with the same contract as [`crate::FsCache`].
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<DateKey, AggregateReport>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportCache for MemoryCache {
    fn get(&self, date: &DateKey) -> Option<AggregateReport> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(date).cloned()
    }

    fn put(&self, date: &DateKey, report: &AggregateReport) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(date.clone(), report.clone());
        Ok(())
    }

    fn remove(&self, date: &DateKey) -> Result<(), CacheError> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).remove(date);
        Ok(())
    }
}

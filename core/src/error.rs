use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced to callers of a report query.
///
/// Per-file parse problems and cache corruption never appear here; they are
/// absorbed inside the engine.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid date {0:?}: expected a non-empty string of digits")]
    InvalidDate(String),
    #[error("scan directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("cannot list scan directory {}: {source}", .path.display())]
    ScanDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl QueryError {
    /// Stable tag used in structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidDate(_) => "invalid_date",
            QueryError::DirectoryNotFound(_) => "directory_not_found",
            QueryError::ScanDirUnreadable { .. } => "scan_dir_unreadable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let a = QueryError::InvalidDate("x".into());
        let b = QueryError::DirectoryNotFound(PathBuf::from("/scans/1"));
        assert_ne!(a.kind(), b.kind());
        assert!(b.to_string().contains("/scans/1"));
    }
}

use scanboard_core::DateKey;
use std::path::Path;

/// Subdirectories of `scan_root` whose names are date keys, most recent
/// first. An unreadable root yields an empty list.
pub fn list_scan_dates(scan_root: &Path) -> Vec<DateKey> {
    let Ok(rd) = std::fs::read_dir(scan_root) else {
        return Vec::new();
    };
    let mut dates: Vec<DateKey> = rd
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| DateKey::parse(&entry.file_name().to_string_lossy()).ok())
        .collect();
    dates.sort_by(|a, b| b.as_str().cmp(a.as_str()));
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn digit_directories_newest_first() {
        let tmp = TempDir::new().unwrap();
        for d in ["20240101", "20231231", "20240215", "latest", "2024-03-01"] {
            std::fs::create_dir(tmp.path().join(d)).unwrap();
        }
        std::fs::write(tmp.path().join("20250101"), b"file, not dir").unwrap();
        let dates: Vec<String> = list_scan_dates(tmp.path()).into_iter().map(|d| d.to_string()).collect();
        assert_eq!(dates, vec!["20240215", "20240101", "20231231"]);
    }

    #[test]
    fn missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(list_scan_dates(&tmp.path().join("absent")).is_empty());
    }
}

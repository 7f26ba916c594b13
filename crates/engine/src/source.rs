use crate::dates::list_scan_dates;
use scanboard_core::DateKey;
use std::io;
use std::path::PathBuf;

/// One scan file inside a date directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFile {
    pub name: String,
    pub path: PathBuf,
}

/// Where scan files come from. The engine only talks to the scan root
/// through this trait.
pub trait ScanSource: Send + Sync {
    fn date_dir(&self, date: &DateKey) -> PathBuf;

    fn dir_exists(&self, date: &DateKey) -> bool {
        self.date_dir(date).is_dir()
    }

    /// `*.xml` files of the date directory in lexical filename order.
    fn list_scan_files(&self, date: &DateKey) -> io::Result<Vec<ScanFile>>;

    fn read_file(&self, file: &ScanFile) -> io::Result<Vec<u8>> {
        std::fs::read(&file.path)
    }

    /// Every date key available, most recent first.
    fn list_dates(&self) -> Vec<DateKey>;
}

/// Scan root laid out as `<root>/<date>/*.xml`.
#[derive(Debug, Clone)]
pub struct FsScanSource {
    root: PathBuf,
}

impl FsScanSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsScanSource { root: root.into() }
    }
}

impl ScanSource for FsScanSource {
    fn date_dir(&self, date: &DateKey) -> PathBuf {
        self.root.join(date.as_str())
    }

    fn list_scan_files(&self, date: &DateKey) -> io::Result<Vec<ScanFile>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(self.date_dir(date))? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "xml") {
                continue;
            }
            files.push(ScanFile { name: entry.file_name().to_string_lossy().into_owned(), path });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn list_dates(&self) -> Vec<DateKey> {
        list_scan_dates(&self.root)
    }
}

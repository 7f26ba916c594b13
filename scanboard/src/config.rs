use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_SCAN_ROOT: &str = "/var/log/nmap/scans";
pub const DEFAULT_CACHE_DIR: &str = "scan-cache";
pub const DEFAULT_WARM_CONCURRENCY: usize = 4;

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub scan_root: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub warm_concurrency: Option<usize>,
}

/// Load `path`, or `./scanboard.yaml` when no path is given and the file
/// exists. Unreadable or invalid files are logged and ignored.
pub fn load_config(path: Option<&Path>) -> Option<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new("scanboard.yaml");
            if p.exists() { p.to_path_buf() } else { return None; }
        }
    };
    let s = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read config file");
            return None;
        }
    };
    match serde_yaml::from_str(&s) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid config file");
            None
        }
    }
}

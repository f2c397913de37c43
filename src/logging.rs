//! Log file setup.
//!
//! Tracing output goes to a file so it never interleaves with the debugger
//! transcript on stdout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use gdbrelay_config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Size at which the log file is rotated at startup (10 MiB).
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated files kept next to the live log.
pub const MAX_LOG_FILES: u32 = 5;

/// `$HOME/.local/share/gdbrelay/gdbrelay.log`, or a `/tmp` fallback.
pub fn default_log_file_path() -> PathBuf {
    match dirs::home_dir().or_else(|| std::env::var_os("HOME").map(PathBuf::from)) {
        Some(home) => home.join(".local/share/gdbrelay/gdbrelay.log"),
        None => PathBuf::from("/tmp/gdbrelay/gdbrelay.log"),
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(config: &LogConfig) -> Result<PathBuf> {
    let path = config.file.clone().unwrap_or_else(default_log_file_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    rotate_log_files(&path, MAX_LOG_SIZE, MAX_LOG_FILES)
        .with_context(|| format!("failed to rotate {}", path.display()))?;

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(path)
}

/// Shift `log` to `log.1`, `log.1` to `log.2` and so on once `log` reaches
/// `max_size` bytes. `log.<max_files>` is dropped.
pub fn rotate_log_files(log_path: &Path, max_size: u64, max_files: u32) -> io::Result<()> {
    match fs::metadata(log_path) {
        Ok(meta) if meta.len() >= max_size => {}
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    }

    let oldest = rotated_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for index in (1..max_files).rev() {
        let from = rotated_path(log_path, index);
        if from.exists() {
            fs::rename(&from, rotated_path(log_path, index + 1))?;
        }
    }
    fs::rename(log_path, rotated_path(log_path, 1))
}

fn rotated_path(base: &Path, index: u32) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{index}"));
    base.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_file_path_names_gdbrelay() {
        let path = default_log_file_path();
        assert!(path.ends_with("gdbrelay/gdbrelay.log"), "got {path:?}");
    }

    #[test]
    fn rotated_path_appends_index() {
        let base = Path::new("/tmp/gdbrelay.log");
        assert_eq!(rotated_path(base, 1), PathBuf::from("/tmp/gdbrelay.log.1"));
        assert_eq!(rotated_path(base, 5), PathBuf::from("/tmp/gdbrelay.log.5"));
    }

    #[test]
    fn rotate_missing_file_is_noop() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("gdbrelay.log");
        rotate_log_files(&log, MAX_LOG_SIZE, MAX_LOG_FILES).unwrap();
        assert!(!dir.path().join("gdbrelay.log.1").exists());
    }

    #[test]
    fn rotate_small_file_is_kept() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("gdbrelay.log");
        fs::write(&log, "short").unwrap();
        rotate_log_files(&log, MAX_LOG_SIZE, MAX_LOG_FILES).unwrap();
        assert!(log.exists());
    }

    #[test]
    fn rotate_cascades_and_drops_oldest() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = dir.path().join("gdbrelay.log");
        fs::write(dir.path().join("gdbrelay.log.1"), "old1").unwrap();
        fs::write(dir.path().join("gdbrelay.log.2"), "old2").unwrap();
        fs::write(&log, "x".repeat(64)).unwrap();

        rotate_log_files(&log, 32, 2).unwrap();

        assert!(!log.exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("gdbrelay.log.1")).unwrap(),
            "x".repeat(64)
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("gdbrelay.log.2")).unwrap(),
            "old1"
        );
        assert!(!dir.path().join("gdbrelay.log.3").exists());
    }
}

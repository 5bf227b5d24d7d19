//! File logger for troubleshooting
//!
//! Useful when stdout/stderr belong to a front end (console loop, web UI)
//! and cannot carry diagnostics.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;

use super::traits::{LogLevel, Logger};

/// A logger that appends records to a file
pub struct FileLogger {
    path: PathBuf,
    file: Mutex<File>,
    min_level: LogLevel,
}

impl FileLogger {
    /// Open (or create) `path` for appending
    pub fn open(path: impl Into<PathBuf>, min_level: LogLevel) -> std::io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            min_level,
        })
    }

    /// Open the default log file (`$TMPDIR/jarbas.log`) with the env threshold
    pub fn open_default() -> std::io::Result<Self> {
        Self::open(default_log_path(), LogLevel::from_env_or(LogLevel::Info))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, level: LogLevel, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| {
                let secs = d.as_secs();
                let millis = d.subsec_millis();
                let hours = (secs % 86400) / 3600;
                let mins = (secs % 3600) / 60;
                let secs = secs % 60;
                format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, millis)
            })
            .unwrap_or_else(|_| "??:??:??.???".to_string());

        let mut file = self.file.lock();
        let _ = writeln!(file, "[{}] [{:<5}] {}", timestamp, level, message);
        let _ = file.flush();
    }
}

impl Logger for FileLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.write(level, message);
    }
}

/// Default log file location
pub fn default_log_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("jarbas.log");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_filters_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jarbas.log");
        let logger = FileLogger::open(&path, LogLevel::Warn).unwrap();

        logger.info("[Test] hidden");
        logger.warn("[Test] kept");

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("hidden"));
        assert!(content.contains("[WARN ] [Test] kept"));
    }
}

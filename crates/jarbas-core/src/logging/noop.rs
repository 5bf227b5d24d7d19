//! Silent logger

use super::traits::{LogLevel, Logger};

/// Discards every record; the default in tests
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _: LogLevel, _: &str) {}
}

//! Logger trait and severity levels

use std::sync::Arc;

/// Record severity, ordered from chattiest to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl LogLevel {
    /// Parse a level name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "debug" | "trace" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Threshold from `JARBAS_LOG_LEVEL`, `default` when unset or unknown
    pub fn from_env_or(default: LogLevel) -> Self {
        std::env::var("JARBAS_LOG_LEVEL")
            .ok()
            .and_then(|v| Self::parse(&v))
            .unwrap_or(default)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}

/// Sink for diagnostic records, injected into every component
///
/// Records read `[Component] message`. Implementors only provide `log`.
///
/// Implementations:
/// - `NoOpLogger`: drops everything
/// - `ConsoleLogger`: stdout/stderr
/// - `FileLogger`: appends to a file
/// - `MemoryLogger`: keeps records for assertions
/// - `ScopedLogger`: adds a component prefix, then forwards
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

pub type SharedLogger = Arc<dyn Logger>;

/// Prefixes every record with `[component]` before forwarding it
pub struct ScopedLogger {
    component: String,
    inner: SharedLogger,
}

impl ScopedLogger {
    pub fn new(component: impl Into<String>, inner: SharedLogger) -> Self {
        Self {
            component: component.into(),
            inner,
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Logger for ScopedLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.inner
            .log(level, &format!("[{}] {}", self.component, message));
    }
}

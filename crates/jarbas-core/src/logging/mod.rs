//! Runtime-agnostic logging
//!
//! Every component takes an `Arc<dyn Logger>`; nothing logs through
//! globals.

mod console;
mod file;
mod memory;
mod noop;
mod traits;

pub use console::ConsoleLogger;
pub use file::{default_log_path, FileLogger};
pub use memory::MemoryLogger;
pub use noop::NoOpLogger;
pub use traits::{LogLevel, Logger, ScopedLogger, SharedLogger};

//! Tool activity notifications
//!
//! Front ends use these to show "calling slack.get_users..." while a turn
//! is in progress.

use parking_lot::Mutex;
use serde_json::Value;

use crate::types::ToolOutcome;

/// One step of tool activity within a turn
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// About to invoke `tool`
    Call { tool: String, arguments: Value },
    /// `tool` finished, successfully or not
    Result { tool: String, result: ToolOutcome },
}

impl ToolEvent {
    /// Event name on the wire: `tool_call` or `tool_result`
    pub fn kind(&self) -> &'static str {
        match self {
            ToolEvent::Call { .. } => "tool_call",
            ToolEvent::Result { .. } => "tool_result",
        }
    }

    pub fn tool(&self) -> &str {
        match self {
            ToolEvent::Call { tool, .. } | ToolEvent::Result { tool, .. } => tool,
        }
    }
}

/// Receives tool events as they happen
pub trait ToolObserver: Send + Sync {
    fn notify(&self, event: ToolEvent);
}

impl<F> ToolObserver for F
where
    F: Fn(ToolEvent) + Send + Sync,
{
    fn notify(&self, event: ToolEvent) {
        self(event)
    }
}

/// Observer that keeps every event
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<ToolEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ToolEvent> {
        self.events.lock().clone()
    }

    /// `(kind, tool)` pairs in arrival order
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        self.events
            .lock()
            .iter()
            .map(|e| (e.kind(), e.tool().to_string()))
            .collect()
    }
}

impl ToolObserver for EventLog {
    fn notify(&self, event: ToolEvent) {
        self.events.lock().push(event);
    }
}

//! Tool registry
//!
//! ```text
//!   Orchestrator ──resolve/query/call──▶ ToolRegistry ──▶ ToolServerClient (one per server)
//!                                         │
//!                                         └─ Arc<Catalog>  (swapped whole on refresh)
//! ```

mod loader;
mod pattern;
mod registry;

pub use loader::{client_for, registry_from_config};
pub use pattern::ToolPattern;
pub use registry::{Catalog, RefreshOutcome, ServerFailure, ToolRegistry};

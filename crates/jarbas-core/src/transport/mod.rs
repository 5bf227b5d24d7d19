//! Transports carrying JSON-RPC messages to tool servers
//!
//! A [`Connector`] turns a [`ServerEndpoint`] into a [`Link`]: a pair of
//! message queues backed by background I/O tasks. Everything above this
//! module (sessions, protocol client) only ever sees JSON values.
//!
//! ```text
//! Session ──outbound──▶ writer task ──▶ socket / stdin / HTTP POST
//! Session ◀──inbound─── reader task ◀── socket / stdout / event stream
//! ```

mod error;
mod endpoint;
mod framing;
mod link;
mod sse;
mod connector;

pub use error::{TransportError, TransportResult};
pub use endpoint::{Framing, ServerEndpoint};
pub use framing::{read_frame, write_frame};
pub use link::{Link, LinkGuard, LINK_BUFFER};
pub use sse::{connect_sse, SseEvent, SseParser};
pub use connector::{Connector, NetworkConnector};

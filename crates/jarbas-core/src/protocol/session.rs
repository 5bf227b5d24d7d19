//! One initialized connection to a tool server
//!
//! A session owns a link, a monotonically increasing request id counter
//! and a table of pending calls. A background dispatch task routes every
//! reply to the waiter registered under its id, so any number of requests
//! may be in flight at once and complete in any order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::logging::Logger;
use crate::transport::{Link, LinkGuard};
use crate::types::CancellationToken;

use super::error::{McpError, McpResult};
use super::options::ClientOptions;
use super::wire::{self, Incoming, Reply, RequestId};

/// JSON-RPC code for an unsupported server-initiated request
const METHOD_NOT_FOUND: i64 = -32601;

/// An outstanding request awaiting its reply
struct PendingCall {
    method: String,
    reply: oneshot::Sender<Reply>,
}

type PendingTable = Arc<Mutex<HashMap<RequestId, PendingCall>>>;

/// What the server reported about itself during the handshake
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default)]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub server_info: ServerIdentity,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

pub struct Session {
    server: String,
    outbound: mpsc::Sender<Value>,
    pending: PendingTable,
    receivers: Mutex<HashMap<RequestId, (String, oneshot::Receiver<Reply>)>>,
    next_id: AtomicU64,
    initialized: AtomicBool,
    closed: Arc<AtomicBool>,
    options: ClientOptions,
    dispatcher: JoinHandle<()>,
    _guard: LinkGuard,
    logger: Arc<dyn Logger>,
}

impl Session {
    /// Take ownership of a link and start dispatching its replies
    ///
    /// The session is not usable until [`Session::initialize`] succeeds.
    pub fn open(
        server: impl Into<String>,
        link: Link,
        options: ClientOptions,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let server = server.into();
        let (outbound, inbound, guard) = link.into_parts();
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        let dispatcher = tokio::spawn(dispatch_loop(
            server.clone(),
            inbound,
            outbound.downgrade(),
            Arc::clone(&pending),
            Arc::clone(&closed),
            Arc::clone(&logger),
        ));

        Self {
            server,
            outbound,
            pending,
            receivers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
            closed,
            options,
            dispatcher,
            _guard: guard,
            logger,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of requests still waiting for a reply
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of sent requests whose reply nobody has asked for yet
    pub fn unclaimed_count(&self) -> usize {
        self.receivers.lock().len()
    }

    /// Perform the `initialize` handshake
    pub async fn initialize(&self) -> McpResult<ServerInfo> {
        let params = json!({
            "protocolVersion": self.options.protocol_version,
            "capabilities": {},
            "clientInfo": {
                "name": self.options.client_name,
                "version": env!("CARGO_PKG_VERSION"),
            },
        });

        let id = self.send_raw("initialize", params).await?;
        let result = match self.receive(id, self.options.handshake_timeout).await? {
            Reply::Result(result) => result,
            Reply::Error(remote) => return Err(McpError::InitializationFailed(remote.to_string())),
        };

        let info: ServerInfo = serde_json::from_value(result)
            .map_err(|e| McpError::InitializationFailed(format!("Malformed initialize result: {}", e)))?;

        self.notify("notifications/initialized", json!({})).await?;
        self.initialized.store(true, Ordering::SeqCst);

        self.logger.info(&format!(
            "[Session:{}] Initialized ({} {}, protocol {})",
            self.server, info.server_info.name, info.server_info.version, info.protocol_version
        ));
        Ok(info)
    }

    /// Send a request and return its id without waiting for the reply
    pub async fn send(&self, method: &str, params: Value) -> McpResult<RequestId> {
        if !self.is_initialized() {
            return Err(McpError::NotInitialized);
        }
        self.send_raw(method, params).await
    }

    /// Wait for the reply to a request previously issued with [`Session::send`]
    pub async fn receive(&self, id: RequestId, timeout: Duration) -> McpResult<Reply> {
        self.receive_with(id, timeout, None).await
    }

    /// Like [`Session::receive`], giving up early when `cancel` fires
    ///
    /// A cancelled request is removed from the pending table and the server
    /// is told via `notifications/cancelled`; a reply arriving later is
    /// dropped by the dispatcher.
    pub async fn receive_with(
        &self,
        id: RequestId,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> McpResult<Reply> {
        let (method, receiver) = self
            .receivers
            .lock()
            .remove(&id)
            .ok_or(McpError::UnknownRequest(id))?;

        let wait = tokio::time::timeout(timeout, receiver);
        let outcome = match cancel {
            Some(token) => match token.run_until_cancelled(wait).await {
                Some(outcome) => outcome,
                None => {
                    self.forget(id);
                    self.logger.debug(&format!(
                        "[Session:{}] Cancelled {} (id {})",
                        self.server, method, id
                    ));
                    let _ = self
                        .notify(
                            "notifications/cancelled",
                            json!({ "requestId": id, "reason": "cancelled by client" }),
                        )
                        .await;
                    return Err(McpError::Cancelled);
                }
            },
            None => wait.await,
        };

        match outcome {
            Ok(Ok(reply)) => Ok(reply),
            // Sender dropped: the dispatcher saw the link end
            Ok(Err(_)) => Err(McpError::TransportClosed),
            Err(_) => {
                self.forget(id);
                self.logger.warn(&format!(
                    "[Session:{}] {} (id {}) timed out after {:?}",
                    self.server, method, id, timeout
                ));
                Err(McpError::Timeout { method, timeout })
            }
        }
    }

    /// Give up on a request sent with [`Session::send`] without waiting
    ///
    /// Releases its reply slot whether or not the reply already arrived; a
    /// reply arriving later is dropped by the dispatcher. Returns false for
    /// an id that is not outstanding.
    pub fn discard(&self, id: RequestId) -> bool {
        let claimed = self.receivers.lock().remove(&id).is_some();
        self.pending.lock().remove(&id);
        if claimed {
            self.logger.debug(&format!("[Session:{}] Discarded id {}", self.server, id));
        }
        claimed
    }

    /// Send a request and wait for its reply using the configured timeout
    pub async fn request(&self, method: &str, params: Value) -> McpResult<Reply> {
        let id = self.send(method, params).await?;
        self.receive(id, self.options.request_timeout).await
    }

    /// Send a request, treating an error envelope as [`McpError::Remote`]
    pub async fn call(&self, method: &str, params: Value) -> McpResult<Value> {
        match self.request(method, params).await? {
            Reply::Result(result) => Ok(result),
            Reply::Error(remote) => Err(McpError::Remote(remote)),
        }
    }

    /// Send a notification
    pub async fn notify(&self, method: &str, params: Value) -> McpResult<()> {
        if self.is_closed() {
            return Err(McpError::TransportClosed);
        }
        self.outbound
            .send(wire::notification(method, params))
            .await
            .map_err(|_| McpError::TransportClosed)
    }

    pub fn request_timeout(&self) -> Duration {
        self.options.request_timeout
    }

    async fn send_raw(&self, method: &str, params: Value) -> McpResult<RequestId> {
        if self.is_closed() {
            return Err(McpError::TransportClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(
            id,
            PendingCall {
                method: method.to_string(),
                reply: tx,
            },
        );
        self.receivers.lock().insert(id, (method.to_string(), rx));

        // The dispatcher marks the session closed before draining the table
        if self.is_closed() {
            self.forget(id);
            return Err(McpError::TransportClosed);
        }

        self.logger.debug(&format!("[Session:{}] -> {} (id {})", self.server, method, id));

        if self.outbound.send(wire::request(id, method, params)).await.is_err() {
            self.forget(id);
            return Err(McpError::TransportClosed);
        }
        Ok(id)
    }

    fn forget(&self, id: RequestId) {
        self.pending.lock().remove(&id);
        self.receivers.lock().remove(&id);
    }

    /// Stop the dispatcher and release the link
    pub fn close(self) {
        self.logger.debug(&format!("[Session:{}] Closing", self.server));
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.dispatcher.abort();
        self.closed.store(true, Ordering::SeqCst);
    }
}

async fn dispatch_loop(
    server: String,
    mut inbound: mpsc::Receiver<Value>,
    outbound: mpsc::WeakSender<Value>,
    pending: PendingTable,
    closed: Arc<AtomicBool>,
    logger: Arc<dyn Logger>,
) {
    while let Some(message) = inbound.recv().await {
        match wire::classify(message) {
            Incoming::Reply { id, reply } => {
                let entry = id.as_u64().and_then(|id| pending.lock().remove(&id));
                match entry {
                    Some(call) => {
                        logger.debug(&format!("[Session:{}] <- {} (id {})", server, call.method, id));
                        // Waiter may have given up already
                        let _ = call.reply.send(reply);
                    }
                    None => {
                        logger.warn(&format!(
                            "[Session:{}] Dropping reply for unknown request id {}",
                            server, id
                        ));
                    }
                }
            }
            Incoming::Request { id, method, .. } => {
                let answer = if method == "ping" {
                    wire::result_envelope(id, json!({}))
                } else {
                    logger.debug(&format!("[Session:{}] Rejecting server request {}", server, method));
                    wire::error_envelope(id, METHOD_NOT_FOUND, &format!("Method not found: {}", method))
                };
                if let Some(outbound) = outbound.upgrade() {
                    let _ = outbound.send(answer).await;
                }
            }
            Incoming::Notification { method, .. } => {
                logger.debug(&format!("[Session:{}] Notification {}", server, method));
            }
            Incoming::Invalid(reason) => {
                logger.warn(&format!("[Session:{}] Ignoring message: {}", server, reason));
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    let abandoned = {
        let mut table = pending.lock();
        let count = table.len();
        table.clear();
        count
    };
    logger.info(&format!(
        "[Session:{}] Transport closed ({} pending requests failed)",
        server, abandoned
    ));
}

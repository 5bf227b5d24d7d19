//! Bounded pool of initialized sessions per server

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::logging::Logger;
use crate::transport::{Connector, ServerEndpoint};

use super::error::{McpError, McpResult};
use super::options::ClientOptions;
use super::session::Session;

/// Hands out sessions to one server, at most `pool_size` at a time
///
/// Sessions are opened lazily and reused once returned. A session whose
/// transport has closed is discarded instead of being returned.
pub struct SessionPool {
    server: String,
    endpoint: ServerEndpoint,
    connector: Arc<dyn Connector>,
    options: ClientOptions,
    permits: Arc<Semaphore>,
    idle: Arc<Mutex<Vec<Session>>>,
    logger: Arc<dyn Logger>,
}

impl SessionPool {
    pub fn new(
        server: impl Into<String>,
        endpoint: ServerEndpoint,
        connector: Arc<dyn Connector>,
        options: ClientOptions,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let size = options.pool_size.max(1);
        Self {
            server: server.into(),
            endpoint,
            connector,
            options,
            permits: Arc::new(Semaphore::new(size)),
            idle: Arc::new(Mutex::new(Vec::new())),
            logger,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sessions parked and ready for reuse
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    /// Connect and handshake a session outside the pool
    pub async fn open_session(&self) -> McpResult<Session> {
        let link = self
            .connector
            .connect(&self.server, &self.endpoint)
            .await
            .map_err(|e| McpError::unreachable(&self.server, e))?;

        let session = Session::open(
            self.server.clone(),
            link,
            self.options.clone(),
            Arc::clone(&self.logger),
        );
        session.initialize().await?;
        Ok(session)
    }

    /// Borrow an initialized session, waiting while the pool is exhausted
    pub async fn acquire(&self) -> McpResult<PooledSession> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| McpError::TransportClosed)?;

        let reusable = {
            let mut idle = self.idle.lock();
            let mut found = None;
            while let Some(session) = idle.pop() {
                if !session.is_closed() {
                    found = Some(session);
                    break;
                }
            }
            found
        };

        let session = match reusable {
            Some(session) => session,
            None => {
                self.logger.debug(&format!("[SessionPool:{}] Opening new session", self.server));
                self.open_session().await?
            }
        };

        Ok(PooledSession {
            session: Some(session),
            idle: Arc::clone(&self.idle),
            _permit: permit,
        })
    }
}

/// A session on loan from a [`SessionPool`]
pub struct PooledSession {
    session: Option<Session>,
    idle: Arc<Mutex<Vec<Session>>>,
    _permit: OwnedSemaphorePermit,
}

impl PooledSession {
    /// Close the session instead of returning it to the pool
    pub fn discard(mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

impl Deref for PooledSession {
    type Target = Session;

    fn deref(&self) -> &Session {
        // Only `discard` and `drop` take the session out
        self.session.as_ref().unwrap_or_else(|| unreachable!("pooled session already released"))
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if !session.is_closed() {
                self.idle.lock().push(session);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::transport::{Link, TransportError, TransportResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves every link with a server that completes the handshake and
    /// then echoes request params back as the result
    struct EchoConnector {
        opened: AtomicUsize,
    }

    #[async_trait]
    impl Connector for EchoConnector {
        async fn connect(&self, _label: &str, _endpoint: &ServerEndpoint) -> TransportResult<Link> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let (client, mut server) = Link::pair();
            tokio::spawn(async move {
                while let Some(message) = server.recv().await {
                    let Some(id) = message.get("id").cloned() else { continue };
                    let result = if message["method"] == "initialize" {
                        json!({"protocolVersion": "2024-11-05", "serverInfo": {"name": "echo"}})
                    } else {
                        message["params"].clone()
                    };
                    server.send(json!({"jsonrpc": "2.0", "id": id, "result": result})).await;
                }
            });
            Ok(client)
        }
    }

    struct RefusingConnector;

    #[async_trait]
    impl Connector for RefusingConnector {
        async fn connect(&self, _label: &str, _endpoint: &ServerEndpoint) -> TransportResult<Link> {
            Err(TransportError::ConnectionFailed("connection refused".into()))
        }
    }

    fn endpoint() -> ServerEndpoint {
        ServerEndpoint::Sse { url: "http://localhost:9/sse".into() }
    }

    #[tokio::test]
    async fn test_sessions_are_reused() {
        let connector = Arc::new(EchoConnector { opened: AtomicUsize::new(0) });
        let pool = SessionPool::new(
            "echo",
            endpoint(),
            connector.clone(),
            ClientOptions::default().with_pool_size(2),
            Arc::new(NoOpLogger),
        );

        {
            let session = pool.acquire().await.unwrap();
            let echoed = session.call("tools/call", json!({"n": 1})).await.unwrap();
            assert_eq!(echoed, json!({"n": 1}));
        }
        assert_eq!(pool.idle_count(), 1);

        let _again = pool.acquire().await.unwrap();
        assert_eq!(connector.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pool_is_bounded() {
        let connector = Arc::new(EchoConnector { opened: AtomicUsize::new(0) });
        let pool = SessionPool::new(
            "echo",
            endpoint(),
            connector.clone(),
            ClientOptions::default().with_pool_size(1),
            Arc::new(NoOpLogger),
        );

        let held = pool.acquire().await.unwrap();
        let blocked =
            tokio::time::timeout(std::time::Duration::from_millis(50), pool.acquire()).await;
        assert!(blocked.is_err());

        drop(held);
        let _next = pool.acquire().await.unwrap();
        assert_eq!(connector.opened.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let pool = SessionPool::new(
            "down",
            endpoint(),
            Arc::new(RefusingConnector),
            ClientOptions::default(),
            Arc::new(NoOpLogger),
        );
        let err = pool.acquire().await.err().unwrap();
        assert!(matches!(err, McpError::ServerUnreachable { ref server, .. } if server == "down"));
    }
}

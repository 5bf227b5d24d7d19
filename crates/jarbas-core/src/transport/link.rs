//! Established message channel to one tool server

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::logging::Logger;

use super::endpoint::Framing;
use super::framing::{read_frame, write_frame};

/// Capacity of the in-process queues on either side of a link
pub const LINK_BUFFER: usize = 64;

/// A bidirectional stream of JSON messages
///
/// `inbound` yields every message the server sends and ends when the
/// connection terminates. Dropping the link (or its guard) stops the
/// background I/O tasks and kills a spawned child process.
pub struct Link {
    outbound: mpsc::Sender<Value>,
    inbound: mpsc::Receiver<Value>,
    guard: LinkGuard,
}

/// Owns the resources behind a link
#[derive(Default)]
pub struct LinkGuard {
    tasks: Vec<JoinHandle<()>>,
    child: Option<Child>,
}

impl Drop for LinkGuard {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}

impl Link {
    /// Wrap raw channel ends
    pub fn new(outbound: mpsc::Sender<Value>, inbound: mpsc::Receiver<Value>) -> Self {
        Self {
            outbound,
            inbound,
            guard: LinkGuard::default(),
        }
    }

    /// Two links wired to each other, for in-process servers
    pub fn pair() -> (Link, Link) {
        let (a_tx, a_rx) = mpsc::channel(LINK_BUFFER);
        let (b_tx, b_rx) = mpsc::channel(LINK_BUFFER);
        (Link::new(a_tx, b_rx), Link::new(b_tx, a_rx))
    }

    /// Run framed reader and writer tasks over a byte stream
    pub fn framed<R, W>(
        reader: R,
        writer: W,
        framing: Framing,
        label: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let label = label.into();
        let (out_tx, mut out_rx) = mpsc::channel::<Value>(LINK_BUFFER);
        let (in_tx, in_rx) = mpsc::channel::<Value>(LINK_BUFFER);

        let writer_task = {
            let logger = Arc::clone(&logger);
            let label = label.clone();
            let mut writer = writer;
            tokio::spawn(async move {
                while let Some(message) = out_rx.recv().await {
                    let body = match serde_json::to_vec(&message) {
                        Ok(body) => body,
                        Err(e) => {
                            logger.error(&format!("[Link:{}] Serialize error: {}", label, e));
                            continue;
                        }
                    };
                    if let Err(e) = write_frame(&mut writer, framing, &body).await {
                        logger.error(&format!("[Link:{}] Write error: {}", label, e));
                        break;
                    }
                }
                logger.debug(&format!("[Link:{}] Writer task exiting", label));
            })
        };

        let reader_task = {
            let mut reader = BufReader::new(reader);
            tokio::spawn(async move {
                loop {
                    match read_frame(&mut reader, framing).await {
                        Ok(Some(body)) => match serde_json::from_slice::<Value>(&body) {
                            Ok(message) => {
                                if in_tx.send(message).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                logger.warn(&format!("[Link:{}] Undecodable message: {}", label, e));
                            }
                        },
                        Ok(None) => {
                            logger.info(&format!("[Link:{}] Connection closed by server", label));
                            break;
                        }
                        Err(e) => {
                            logger.error(&format!("[Link:{}] Read error: {}", label, e));
                            break;
                        }
                    }
                }
            })
        };

        let mut link = Link::new(out_tx, in_rx);
        link.guard.tasks.push(writer_task);
        link.guard.tasks.push(reader_task);
        link
    }

    /// Attach a background task whose lifetime is bound to the link
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.guard.tasks.push(task);
        self
    }

    /// Attach a child process that is killed when the link goes away
    pub fn with_child(mut self, child: Child) -> Self {
        self.guard.child = Some(child);
        self
    }

    /// Split into sender, receiver and resource guard
    pub fn into_parts(self) -> (mpsc::Sender<Value>, mpsc::Receiver<Value>, LinkGuard) {
        (self.outbound, self.inbound, self.guard)
    }

    /// Send one message
    pub async fn send(&self, message: Value) -> bool {
        self.outbound.send(message).await.is_ok()
    }

    /// Receive the next message, `None` once the peer is gone
    pub async fn recv(&mut self) -> Option<Value> {
        self.inbound.recv().await
    }
}

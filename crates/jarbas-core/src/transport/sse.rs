//! Server-Sent Events transport
//!
//! The client opens a long-lived GET on the server's event stream. The
//! first `endpoint` event names the URL requests must be POSTed to; every
//! `message` event afterwards carries one JSON-RPC message.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::logging::Logger;

use super::error::{TransportError, TransportResult};
use super::link::{Link, LINK_BUFFER};

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Incremental parser for `text/event-stream` bodies
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every event it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');

            if line.is_empty() {
                if let Some(event) = self.dispatch() {
                    events.push(event);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        events
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

/// Open an SSE link to `url`
///
/// Resolves once the server has announced its POST endpoint.
pub async fn connect_sse(
    http: reqwest::Client,
    url: &str,
    label: &str,
    logger: Arc<dyn Logger>,
) -> TransportResult<Link> {
    let base = reqwest::Url::parse(url)
        .map_err(|e| TransportError::ConnectionFailed(format!("Invalid URL {}: {}", url, e)))?;

    let response = http
        .get(base.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(TransportError::ConnectionFailed(format!(
            "{} returned HTTP {}",
            url,
            response.status()
        )));
    }

    let (endpoint_tx, endpoint_rx) = oneshot::channel::<String>();
    let (in_tx, in_rx) = mpsc::channel::<Value>(LINK_BUFFER);

    let reader_task = {
        let logger = Arc::clone(&logger);
        let label = label.to_string();
        let mut stream = response.bytes_stream();
        tokio::spawn(async move {
            let mut parser = SseParser::new();
            let mut endpoint_tx = Some(endpoint_tx);
            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        logger.error(&format!("[Sse:{}] Stream error: {}", label, e));
                        break;
                    }
                };
                for event in parser.feed(&chunk) {
                    match event.event.as_str() {
                        "endpoint" => {
                            if let Some(tx) = endpoint_tx.take() {
                                let _ = tx.send(event.data.trim().to_string());
                            }
                        }
                        "message" => match serde_json::from_str::<Value>(&event.data) {
                            Ok(message) => {
                                if in_tx.send(message).await.is_err() {
                                    return;
                                }
                            }
                            Err(e) => {
                                logger.warn(&format!("[Sse:{}] Undecodable message: {}", label, e));
                            }
                        },
                        other => {
                            logger.debug(&format!("[Sse:{}] Ignoring event '{}'", label, other));
                        }
                    }
                }
            }
            logger.info(&format!("[Sse:{}] Event stream ended", label));
        })
    };

    let endpoint = match endpoint_rx.await {
        Ok(endpoint) => endpoint,
        Err(_) => {
            reader_task.abort();
            return Err(TransportError::ConnectionFailed(format!(
                "{} closed the stream before announcing an endpoint",
                url
            )));
        }
    };
    let post_url = base
        .join(&endpoint)
        .map_err(|e| TransportError::ConnectionFailed(format!("Invalid endpoint {}: {}", endpoint, e)))?;

    logger.debug(&format!("[Sse:{}] Posting messages to {}", label, post_url));

    let (out_tx, mut out_rx) = mpsc::channel::<Value>(LINK_BUFFER);
    let writer_task = {
        let label = label.to_string();
        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                match http.post(post_url.clone()).json(&message).send().await {
                    Ok(response) if !response.status().is_success() => {
                        logger.warn(&format!(
                            "[Sse:{}] POST rejected with HTTP {}",
                            label,
                            response.status()
                        ));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        logger.error(&format!("[Sse:{}] POST failed: {}", label, e));
                        break;
                    }
                }
            }
        })
    };

    Ok(Link::new(out_tx, in_rx)
        .with_task(reader_task)
        .with_task(writer_task))
}

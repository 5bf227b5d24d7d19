//! Message framing over byte streams

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::endpoint::Framing;
use super::error::{TransportError, TransportResult};

/// Read one framed message body
///
/// Returns `Ok(None)` on a clean EOF between messages.
pub async fn read_frame<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    framing: Framing,
) -> TransportResult<Option<Vec<u8>>> {
    match framing {
        Framing::ContentLength => read_content_length(reader).await,
        Framing::Newline => read_line_frame(reader).await,
    }
}

/// Write one framed message body and flush
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    framing: Framing,
    body: &[u8],
) -> TransportResult<()> {
    match framing {
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", body.len());
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(body).await?;
        }
        Framing::Newline => {
            writer.write_all(body).await?;
            writer.write_all(b"\n").await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

async fn read_content_length<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> TransportResult<Option<Vec<u8>>> {
    let mut content_length: Option<usize> = None;
    let mut line = String::new();
    let mut saw_header = false;

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            if saw_header {
                return Err(TransportError::InvalidFrame(
                    "Connection closed inside headers".to_string(),
                ));
            }
            return Ok(None);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            if saw_header {
                break;
            }
            // Tolerate stray blank lines between messages
            continue;
        }
        saw_header = true;

        if let Some(len_str) = trimmed.strip_prefix("Content-Length:") {
            content_length = Some(len_str.trim().parse().map_err(|_| {
                TransportError::InvalidFrame(format!("Invalid Content-Length: {}", len_str.trim()))
            })?);
        }
        // Other headers (Content-Type, ...) are ignored
    }

    let length = content_length
        .ok_or_else(|| TransportError::InvalidFrame("Missing Content-Length header".to_string()))?;

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

async fn read_line_frame<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> TransportResult<Option<Vec<u8>>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(Some(trimmed.as_bytes().to_vec()));
        }
    }
}

use crate::dispatch::Dispatcher;
use crate::error::PARSE_ERROR;
use crate::mcp::{handle_message, rpc_error, Response};
use crate::tools::PROTOCOL_VERSION;
use log::{debug, info, warn};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// How a message arrived; the reply is written the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// One JSON document per line.
    Line,
    /// `Content-Length: N` header block followed by N bytes.
    ContentLength,
}

/// Largest `Content-Length` body accepted; bigger frames are drained and refused.
pub const MAX_FRAME: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Message(String, Framing),
    /// Declared body length over `MAX_FRAME`; the body was discarded.
    Oversized(usize),
}

pub async fn run_stdio_server(dispatcher: &Dispatcher) -> anyhow::Result<()> {
    info!("Starting huntress-mcp stdio server; protocol={}", PROTOCOL_VERSION);
    let reader = BufReader::new(io::stdin());
    let writer = io::stdout();
    tokio::select! {
        res = serve(reader, writer, dispatcher) => res?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted; shutting down"),
    }
    Ok(())
}

/// Read messages until EOF, answering each request in order.
pub async fn serve<R, W>(mut reader: R, mut writer: W, dispatcher: &Dispatcher) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = read_message(&mut reader).await? {
        let (resp, framing) = match frame {
            Frame::Message(raw, framing) => {
                (handle_message(dispatcher, &raw, None).await, framing)
            }
            Frame::Oversized(len) => {
                let msg = format!(
                    "Parse error: frame of {} bytes exceeds {} byte limit",
                    len, MAX_FRAME
                );
                (Some(rpc_error(None, PARSE_ERROR, &msg)), Framing::ContentLength)
            }
        };
        if let Some(resp) = resp {
            write_response(&mut writer, &resp, framing).await?;
        }
    }
    debug!("stdin closed");
    Ok(())
}

pub async fn read_message<R>(reader: &mut R) -> io::Result<Option<Frame>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some(len) = content_length(trimmed) else {
            return Ok(Some(Frame::Message(trimmed.to_string(), Framing::Line)));
        };
        // Skip any remaining headers up to the blank separator line.
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }
            if line.trim().is_empty() {
                break;
            }
        }
        if len > MAX_FRAME {
            warn!("Refusing {} byte frame", len);
            let mut body = (&mut *reader).take(len as u64);
            io::copy(&mut body, &mut io::sink()).await?;
            return Ok(Some(Frame::Oversized(len)));
        }
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).await?;
        return Ok(Some(Frame::Message(
            String::from_utf8_lossy(&body).into_owned(),
            Framing::ContentLength,
        )));
    }
}

fn content_length(line: &str) -> Option<usize> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse().ok()
}

async fn write_response<W>(out: &mut W, resp: &Response, framing: Framing) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_string(resp)?;
    match framing {
        Framing::Line => {
            out.write_all(payload.as_bytes()).await?;
            out.write_all(b"\n").await?;
        }
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", payload.len());
            out.write_all(header.as_bytes()).await?;
            out.write_all(payload.as_bytes()).await?;
        }
    }
    out.flush().await?;
    Ok(())
}

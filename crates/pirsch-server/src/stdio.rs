//! Newline-delimited JSON-RPC over stdin/stdout.

use crate::rpc::{error_response, McpHandler, RpcError};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

/// Serve on the process's stdin and stdout until stdin closes.
pub async fn serve_stdio(handler: McpHandler) -> anyhow::Result<()> {
    info!("Serving tools on stdio");
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    serve_lines(&handler, reader, writer).await
}

/// One message per line in, one response per line out. Blank lines are
/// skipped; a line that is not UTF-8 gets a parse error like malformed JSON.
pub async fn serve_lines<R, W>(handler: &McpHandler, mut reader: R, mut writer: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let response = match std::str::from_utf8(&buf) {
            Ok(text) => {
                let line = text.trim();
                if line.is_empty() {
                    continue;
                }
                handler.handle_text(line).await
            }
            Err(e) => {
                warn!("Dropping non-UTF-8 input line: {}", e);
                Some(error_response(
                    Value::Null,
                    RpcError::parse_error(format!("Parse error: {e}")),
                ))
            }
        };
        if let Some(response) = response {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
    info!("stdin closed, shutting down");
    Ok(())
}

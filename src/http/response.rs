//! HTTP response writing module
//!
//! Emits status lines, CRLF-framed header blocks, and range-bounded file
//! bodies directly onto the connection. Every response carries
//! `Connection: close`; this server never keeps a connection alive.

use std::io::{self, SeekFrom};
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::handler::resolver::ResolvedTarget;
use crate::http::range::ByteRange;
use crate::logger;

/// Fixed buffer size for body copies.
const CHUNK_SIZE: usize = 8 * 1024;

const fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        206 => "Partial Content",
        404 => "Not Found",
        405 => "Method Not Allowed",
        416 => "Range Not Satisfiable",
        _ => "",
    }
}

/// Assemble the head: status line, headers, `Connection: close`, blank line.
/// Every line is CRLF-terminated per HTTP/1.1 framing.
fn build_head(status: u16, headers: &[(&str, String)]) -> String {
    let mut head = format!("HTTP/1.1 {} {}\r\n", status, reason_phrase(status));
    for (name, value) in headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("Connection: close\r\n\r\n");
    head
}

/// 404 with a short plain-text body (headers only on HEAD).
pub async fn write_404<W>(stream: &mut W, is_head: bool) -> io::Result<(u16, u64)>
where
    W: AsyncWrite + Unpin,
{
    const BODY: &str = "404 Not Found";
    let head = build_head(
        404,
        &[
            ("Content-Type", "text/plain".to_string()),
            ("Content-Length", BODY.len().to_string()),
        ],
    );
    stream.write_all(head.as_bytes()).await?;
    let mut sent = 0;
    if !is_head {
        stream.write_all(BODY.as_bytes()).await?;
        sent = BODY.len() as u64;
    }
    stream.flush().await?;
    Ok((404, sent))
}

/// 405 with an `Allow` header and no body bytes.
pub async fn write_405<W>(stream: &mut W) -> io::Result<(u16, u64)>
where
    W: AsyncWrite + Unpin,
{
    let head = build_head(
        405,
        &[
            ("Allow", "GET, HEAD".to_string()),
            ("Content-Length", "0".to_string()),
        ],
    );
    stream.write_all(head.as_bytes()).await?;
    stream.flush().await?;
    Ok((405, 0))
}

/// 416 with `Content-Range: bytes */<length>` and no body, per RFC semantics.
pub async fn write_416<W>(stream: &mut W, length: u64) -> io::Result<(u16, u64)>
where
    W: AsyncWrite + Unpin,
{
    let head = build_head(
        416,
        &[
            ("Content-Range", format!("bytes */{length}")),
            ("Content-Length", "0".to_string()),
        ],
    );
    stream.write_all(head.as_bytes()).await?;
    stream.flush().await?;
    Ok((416, 0))
}

/// 200 with an HTML body (headers only on HEAD). Used by the listing page.
pub async fn write_html<W>(stream: &mut W, html: &str, is_head: bool) -> io::Result<(u16, u64)>
where
    W: AsyncWrite + Unpin,
{
    let head = build_head(
        200,
        &[
            ("Content-Type", "text/html; charset=utf-8".to_string()),
            ("Content-Length", html.len().to_string()),
        ],
    );
    stream.write_all(head.as_bytes()).await?;
    let mut sent = 0;
    if !is_head {
        stream.write_all(html.as_bytes()).await?;
        sent = html.len() as u64;
    }
    stream.flush().await?;
    Ok((200, sent))
}

/// Serve the resolved file: 200 or 206 head, then (for GET) exactly the
/// range's bytes. A write failure mid-body surfaces to the caller, which
/// treats it as a routine peer disconnect rather than a server error.
pub async fn write_file<W>(
    stream: &mut W,
    target: &ResolvedTarget,
    range: ByteRange,
    is_head: bool,
) -> io::Result<(u16, u64)>
where
    W: AsyncWrite + Unpin,
{
    let content_length = range.byte_count(target.length);
    let status = if range.is_partial { 206 } else { 200 };

    let mut headers = vec![
        ("Content-Type", target.content_type.to_string()),
        ("Content-Length", content_length.to_string()),
        ("Accept-Ranges", "bytes".to_string()),
    ];
    if range.is_partial {
        headers.push((
            "Content-Range",
            format!("bytes {}-{}/{}", range.start, range.end, target.length),
        ));
    }

    stream.write_all(build_head(status, &headers).as_bytes()).await?;
    if is_head || content_length == 0 {
        stream.flush().await?;
        return Ok((status, 0));
    }

    let sent = copy_range(stream, &target.path, range.start, content_length).await?;
    stream.flush().await?;
    Ok((status, sent))
}

/// Seek to `start` and copy exactly `remaining` bytes in fixed-size chunks,
/// using this handler's own file handle so no file-position state is shared.
async fn copy_range<W>(
    stream: &mut W,
    path: &Path,
    start: u64,
    mut remaining: u64,
) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(start)).await?;

    let mut buf = [0_u8; CHUNK_SIZE];
    let mut sent: u64 = 0;
    while remaining > 0 {
        let want = usize::try_from(remaining.min(CHUNK_SIZE as u64)).unwrap_or(CHUNK_SIZE);
        let n = file.read(&mut buf[..want]).await?;
        if n == 0 {
            // File shrank between stat and read; stop short of the promise
            logger::log_warning(&format!(
                "file truncated mid-stream: {} ({remaining} bytes short)",
                path.display()
            ));
            break;
        }
        stream.write_all(&buf[..n]).await?;
        sent += n as u64;
        remaining -= n as u64;
    }
    Ok(sent)
}

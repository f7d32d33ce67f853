// Connection handling module
// One accepted connection, owned end to end: read the request, resolve the
// path, resolve the range, write the response, close

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler::{listing, resolver};
use crate::http::range::resolve_range;
use crate::http::request::{self, Method, Request};
use crate::http::response;
use crate::logger::{self, AccessLogEntry};

/// Accept one connection: enforce the optional connection limit, then hand
/// the stream to its own task so a slow client never blocks the accept loop.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment first, then check, so two racing accepts cannot both pass
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);
    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.cached_access_log.load(Ordering::Relaxed) {
        logger::log_connection_accepted(&peer_addr);
    }

    let state = Arc::clone(state);
    let conn_counter = Arc::clone(conn_counter);
    tokio::spawn(async move {
        handle_connection(stream, peer_addr, &state).await;
        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Drive one connection to completion. Every failure is contained here: the
/// stream is dropped (closed) on all paths and nothing reaches the accept
/// loop or other connections.
async fn handle_connection(stream: TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) {
    if let Err(e) = serve(stream, peer_addr, state).await {
        // Peers hang up mid-stream whenever a player seeks; routine, not fatal
        logger::log_warning(&format!("connection from {peer_addr} ended early: {e}"));
    }
}

async fn serve(stream: TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) -> std::io::Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // No read timeout: an idle client parks this task until it disconnects
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    let request_line = line.trim_end();
    if n == 0 || request_line.is_empty() {
        return Ok(()); // idle or aborted connection, drop silently
    }

    // Not exactly METHOD SP path SP version: drop without a response
    let Some(parsed) = request::parse_request_line(request_line) else {
        return Ok(());
    };

    let Some(method) = Method::parse(&parsed.method) else {
        let (status, body_bytes) = response::write_405(&mut writer).await?;
        log_request(state, peer_addr, &parsed.method, parsed.path, status, body_bytes, None);
        return Ok(());
    };

    let fields = request::read_header_fields(&mut reader).await?;
    let req = Request {
        method,
        path: parsed.path,
        range_header: fields.range,
        user_agent: fields.user_agent,
    };

    let target = resolver::resolve(&state.media_root, &req.path, &state.config.media.index_files);

    let (status, body_bytes) = if target.exists {
        match resolve_range(req.range_header.as_deref(), target.length) {
            Ok(range) => response::write_file(&mut writer, &target, range, method.is_head()).await?,
            Err(_) => response::write_416(&mut writer, target.length).await?,
        }
    } else if target.is_dir && state.config.media.directory_listing {
        let html = {
            let index = state.index.read().await;
            listing::render(&index)
        };
        response::write_html(&mut writer, &html, method.is_head()).await?
    } else {
        response::write_404(&mut writer, method.is_head()).await?
    };

    log_request(
        state,
        peer_addr,
        method.as_str(),
        req.path,
        status,
        body_bytes,
        req.user_agent,
    );
    Ok(())
}

fn log_request(
    state: &Arc<AppState>,
    peer_addr: SocketAddr,
    method: &str,
    path: String,
    status: u16,
    body_bytes: u64,
    user_agent: Option<String>,
) {
    if !state.cached_access_log.load(Ordering::Relaxed) {
        return;
    }
    let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method, path);
    entry.status = status;
    entry.body_bytes = body_bytes;
    entry.user_agent = user_agent;
    logger::log_access(&entry, &state.config.logging.access_log_format);
}

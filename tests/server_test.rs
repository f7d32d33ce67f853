// End-to-end tests over real sockets: each test binds its own listener on
// an ephemeral port, runs the accept loop, and speaks raw HTTP/1.1 through
// a TcpStream. The server closes every connection, so a client reads to EOF
// to collect the whole response.
//
// Nothing here exercises idle-client timeouts: the server intentionally
// enforces none, so a client that never sends a request line parks its
// handler until it disconnects.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use mserve::config::{AppState, Config};
use mserve::media::MediaIndex;
use mserve::server;

struct TestServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
    // Held so the media root outlives the server
    _root: tempfile::TempDir,
}

async fn start_server(files: &[(&str, Vec<u8>)], directory_listing: bool) -> TestServer {
    let root = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        let path = root.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
    }

    let mut cfg = Config::load_from("no-such-test-config").unwrap();
    cfg.media.root = root.path().to_string_lossy().into_owned();
    cfg.media.directory_listing = directory_listing;
    cfg.logging.access_log = false;

    let media_root = root.path().canonicalize().unwrap();
    let index = MediaIndex::scan(&media_root).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(AppState::new(cfg, media_root, index));
    let handle = tokio::spawn(server::run(listener, Arc::clone(&state)));

    TestServer {
        addr,
        state,
        handle,
        _root: root,
    }
}

/// Send one raw request and read the response to EOF. Returns the header
/// block as text and the body as bytes.
async fn send_request(addr: SocketAddr, request: &str) -> (String, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();

    match response.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(pos) => (
            String::from_utf8(response[..pos].to_vec()).unwrap(),
            response[pos + 4..].to_vec(),
        ),
        None => (String::from_utf8(response).unwrap(), Vec::new()),
    }
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (n, v) = line.split_once(':')?;
        n.eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

fn song_bytes(len: usize) -> Vec<u8> {
    (0..=255_u8).cycle().take(len).collect()
}

#[tokio::test]
async fn full_get_returns_entire_file() {
    let data = song_bytes(1000);
    let srv = start_server(&[("song.mp3", data.clone())], false).await;

    let (head, body) = send_request(srv.addr, "GET /song.mp3 HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(header_value(&head, "Content-Type"), Some("audio/mpeg"));
    assert_eq!(header_value(&head, "Content-Length"), Some("1000"));
    assert_eq!(header_value(&head, "Accept-Ranges"), Some("bytes"));
    assert!(header_value(&head, "Content-Range").is_none());
    assert_eq!(body, data);
}

#[tokio::test]
async fn range_request_returns_partial_content() {
    let data = song_bytes(1000);
    let srv = start_server(&[("song.mp3", data.clone())], false).await;

    let (head, body) = send_request(
        srv.addr,
        "GET /song.mp3 HTTP/1.1\r\nRange: bytes=200-299\r\n\r\n",
    )
    .await;
    assert!(head.starts_with("HTTP/1.1 206 Partial Content"));
    assert_eq!(header_value(&head, "Content-Type"), Some("audio/mpeg"));
    assert_eq!(header_value(&head, "Content-Range"), Some("bytes 200-299/1000"));
    assert_eq!(header_value(&head, "Content-Length"), Some("100"));
    assert_eq!(body, data[200..=299].to_vec());
}

#[tokio::test]
async fn arbitrary_valid_ranges_match_file_slices() {
    let data = song_bytes(1000);
    let srv = start_server(&[("song.mp3", data.clone())], false).await;

    for (start, end) in [(0_usize, 0_usize), (0, 999), (999, 999), (1, 998), (500, 501)] {
        let request = format!("GET /song.mp3 HTTP/1.1\r\nRange: bytes={start}-{end}\r\n\r\n");
        let (head, body) = send_request(srv.addr, &request).await;
        assert!(head.starts_with("HTTP/1.1 206"), "range {start}-{end}");
        assert_eq!(
            header_value(&head, "Content-Range"),
            Some(format!("bytes {start}-{end}/1000").as_str())
        );
        assert_eq!(body.len(), end - start + 1);
        assert_eq!(body, data[start..=end].to_vec());
    }
}

#[tokio::test]
async fn open_ended_range_runs_to_end_of_file() {
    let data = song_bytes(500);
    let srv = start_server(&[("song.mp3", data.clone())], false).await;

    let (head, body) = send_request(
        srv.addr,
        "GET /song.mp3 HTTP/1.1\r\nRange: bytes=100-\r\n\r\n",
    )
    .await;
    assert!(head.starts_with("HTTP/1.1 206"));
    assert_eq!(header_value(&head, "Content-Range"), Some("bytes 100-499/500"));
    assert_eq!(header_value(&head, "Content-Length"), Some("400"));
    assert_eq!(body, data[100..].to_vec());
}

#[tokio::test]
async fn suffix_range_returns_trailing_bytes() {
    let data = song_bytes(500);
    let srv = start_server(&[("song.mp3", data.clone())], false).await;

    let (head, body) = send_request(
        srv.addr,
        "GET /song.mp3 HTTP/1.1\r\nRange: bytes=-100\r\n\r\n",
    )
    .await;
    assert!(head.starts_with("HTTP/1.1 206"));
    assert_eq!(header_value(&head, "Content-Range"), Some("bytes 400-499/500"));
    assert_eq!(body, data[400..].to_vec());
}

#[tokio::test]
async fn unsatisfiable_ranges_return_416() {
    let srv = start_server(&[("song.mp3", song_bytes(1000))], false).await;

    // start == length
    let (head, body) = send_request(
        srv.addr,
        "GET /song.mp3 HTTP/1.1\r\nRange: bytes=1000-\r\n\r\n",
    )
    .await;
    assert!(head.starts_with("HTTP/1.1 416 Range Not Satisfiable"));
    assert_eq!(header_value(&head, "Content-Range"), Some("bytes */1000"));
    assert!(body.is_empty());

    // start > end
    let (head, body) = send_request(
        srv.addr,
        "GET /song.mp3 HTTP/1.1\r\nRange: bytes=300-200\r\n\r\n",
    )
    .await;
    assert!(head.starts_with("HTTP/1.1 416"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn range_on_empty_file_returns_416() {
    let srv = start_server(&[("empty.png", Vec::new())], false).await;

    let (head, _) = send_request(
        srv.addr,
        "GET /empty.png HTTP/1.1\r\nRange: bytes=0-0\r\n\r\n",
    )
    .await;
    assert!(head.starts_with("HTTP/1.1 416"));
    assert_eq!(header_value(&head, "Content-Range"), Some("bytes */0"));

    // Without a range an empty file is simply zero bytes of content
    let (head, body) = send_request(srv.addr, "GET /empty.png HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200"));
    assert_eq!(header_value(&head, "Content-Length"), Some("0"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn malformed_range_degrades_to_full_content() {
    let data = song_bytes(300);
    let srv = start_server(&[("song.mp3", data.clone())], false).await;

    for range in ["bytes=a-b", "bytes=0-9,20-29", "items=0-9"] {
        let request = format!("GET /song.mp3 HTTP/1.1\r\nRange: {range}\r\n\r\n");
        let (head, body) = send_request(srv.addr, &request).await;
        assert!(head.starts_with("HTTP/1.1 200"), "range header {range:?}");
        assert_eq!(body, data);
    }
}

#[tokio::test]
async fn missing_file_returns_404() {
    let srv = start_server(&[("song.mp3", song_bytes(10))], false).await;

    let (head, body) = send_request(srv.addr, "GET /missing.jpg HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 404 Not Found"));
    assert!(header_value(&head, "Content-Range").is_none());
    assert_eq!(body, b"404 Not Found");
}

#[tokio::test]
async fn head_request_sends_headers_only() {
    let srv = start_server(&[("song.mp3", song_bytes(1000))], false).await;

    let (head, body) = send_request(srv.addr, "HEAD /song.mp3 HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(header_value(&head, "Content-Length"), Some("1000"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn head_with_range_sends_partial_headers_only() {
    let srv = start_server(&[("song.mp3", song_bytes(1000))], false).await;

    let (head, body) = send_request(
        srv.addr,
        "HEAD /song.mp3 HTTP/1.1\r\nRange: bytes=0-99\r\n\r\n",
    )
    .await;
    assert!(head.starts_with("HTTP/1.1 206"));
    assert_eq!(header_value(&head, "Content-Range"), Some("bytes 0-99/1000"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn post_returns_405_with_allow_header() {
    let srv = start_server(&[("song.mp3", song_bytes(10))], false).await;

    let (head, body) = send_request(srv.addr, "POST /song.mp3 HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 405 Method Not Allowed"));
    assert_eq!(header_value(&head, "Allow"), Some("GET, HEAD"));
    assert!(body.is_empty());
}

#[tokio::test]
async fn malformed_request_line_gets_no_response() {
    let srv = start_server(&[("song.mp3", song_bytes(10))], false).await;

    for request in ["GARBAGE\r\n\r\n", "GET /song.mp3\r\n\r\n", "\r\n"] {
        let mut stream = TcpStream::connect(srv.addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        assert!(response.is_empty(), "request {request:?} should be dropped silently");
    }
}

#[tokio::test]
async fn path_traversal_is_not_found() {
    let srv = start_server(&[("song.mp3", song_bytes(10))], false).await;

    for path in ["/../../etc/passwd", "/%2e%2e/%2e%2e/etc/passwd", "/..%2f..%2fetc/passwd"] {
        let request = format!("GET {path} HTTP/1.1\r\n\r\n");
        let (head, _) = send_request(srv.addr, &request).await;
        assert!(head.starts_with("HTTP/1.1 404"), "path {path:?} must not escape the root");
    }
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let srv = start_server(&[("song.mp3", song_bytes(1000))], false).await;

    let request = "GET /song.mp3 HTTP/1.1\r\nRange: bytes=10-19\r\n\r\n";
    let first = send_request(srv.addr, request).await;
    let second = send_request(srv.addr, request).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn directory_without_index_is_404_by_default() {
    let srv = start_server(&[("song.mp3", song_bytes(10))], false).await;

    let (head, _) = send_request(srv.addr, "GET / HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 404"));
}

#[tokio::test]
async fn directory_listing_renders_when_enabled() {
    let files = [
        ("song.mp3", song_bytes(10)),
        ("videos/clip.mp4", song_bytes(10)),
    ];
    let srv = start_server(&files, true).await;

    let (head, body) = send_request(srv.addr, "GET / HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200"));
    assert_eq!(
        header_value(&head, "Content-Type"),
        Some("text/html; charset=utf-8")
    );
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("href=\"/song.mp3\""));
    assert!(html.contains("href=\"/videos/clip.mp4\""));
}

#[tokio::test]
async fn directory_with_index_serves_the_index() {
    let files = [("index.html", b"<html>home</html>".to_vec())];
    let srv = start_server(&files, false).await;

    let (head, body) = send_request(srv.addr, "GET / HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200"));
    assert_eq!(
        header_value(&head, "Content-Type"),
        Some("text/html; charset=utf-8")
    );
    assert_eq!(body, b"<html>home</html>");
}

#[tokio::test]
async fn nested_file_is_served() {
    let data = song_bytes(64);
    let srv = start_server(&[("videos/clip.mp4", data.clone())], false).await;

    let (head, body) = send_request(srv.addr, "GET /videos/clip.mp4 HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200"));
    assert_eq!(header_value(&head, "Content-Type"), Some("video/mp4"));
    assert_eq!(body, data);
}

#[tokio::test]
async fn shutdown_stops_accepting_new_connections() {
    let srv = start_server(&[("song.mp3", song_bytes(10))], false).await;

    // Server answers normally before the stop signal
    let (head, _) = send_request(srv.addr, "GET /song.mp3 HTTP/1.1\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200"));

    srv.state.shutdown.notify_one();
    srv.handle.await.unwrap().unwrap();

    // The listening socket is closed once the loop exits
    assert!(TcpStream::connect(srv.addr).await.is_err());
}

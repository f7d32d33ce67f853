//! HTTP request parsing module
//!
//! Reads the request line and header block off a buffered socket. Only the
//! small slice of HTTP/1.1 this server speaks is recognized; everything else
//! is either answered with a status code or dropped by the caller.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// The only methods this server serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

impl Method {
    /// Parse a request-line method token. Anything but GET/HEAD is
    /// answered 405 by the connection handler.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            _ => None,
        }
    }

    pub const fn is_head(self) -> bool {
        matches!(self, Self::Head)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
        }
    }
}

/// One parsed request. Built once per connection, immutable afterwards,
/// discarded when the connection closes.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub range_header: Option<String>,
    /// Captured for access logging only; has no protocol effect.
    pub user_agent: Option<String>,
}

/// The raw tokens of a request line, before method validation.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
}

/// Split a request line into its three tokens. Anything that is not exactly
/// `METHOD SP path SP version` is malformed and the caller drops the
/// connection without a response.
pub fn parse_request_line(line: &str) -> Option<RequestLine> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    let _version = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(RequestLine {
        method: method.to_string(),
        path: path.to_string(),
    })
}

/// The headers this server cares about; all others are skipped. There is no
/// keep-alive, no conditional requests, no content negotiation.
#[derive(Debug, Default)]
pub struct HeaderFields {
    pub range: Option<String>,
    pub user_agent: Option<String>,
}

/// Read header lines until the blank line that ends the block (or EOF).
/// Header names are matched case-insensitively; lines without a colon are
/// skipped rather than rejected.
pub async fn read_header_fields<R>(reader: &mut R) -> io::Result<HeaderFields>
where
    R: AsyncBufRead + Unpin,
{
    let mut fields = HeaderFields::default();
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        let trimmed = line.trim_end();
        if n == 0 || trimmed.is_empty() {
            break;
        }
        let Some((name, value)) = trimmed.split_once(':') else {
            continue;
        };
        if name.eq_ignore_ascii_case("range") {
            fields.range = Some(value.trim().to_string());
        } else if name.eq_ignore_ascii_case("user-agent") {
            fields.user_agent = Some(value.trim().to_string());
        }
    }
    Ok(fields)
}

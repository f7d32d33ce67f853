//! Access log format module
//!
//! Supports three formats selected by `logging.access_log_format`:
//! - `combined` (Apache/Nginx combined format, minus the referer)
//! - `common` (Common Log Format)
//! - `json` (structured, one object per line)

use chrono::Local;

/// One completed request, as seen by the access log
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Completion timestamp
    pub time: chrono::DateTime<Local>,
    /// Request method token
    pub method: String,
    /// Request path as sent by the client
    pub path: String,
    /// Response status code
    pub status: u16,
    /// Body bytes actually written (0 for HEAD and early disconnects)
    pub body_bytes: u64,
    /// User-Agent header, when the client sent one
    pub user_agent: Option<String>,
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: &str, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method: method.to_string(),
            path,
            status: 0,
            body_bytes: 0,
            user_agent: None,
        }
    }

    /// Format the entry according to the configured format name; unknown
    /// names fall back to `common`.
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "json" => self.format_json(),
            _ => self.format_common(),
        }
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes "$http_user_agent"`
    fn format_combined(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/1.1\" {} {} \"{}\"",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            self.status,
            self.body_bytes,
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// Common Log Format (CLF)
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/1.1\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            self.status,
            self.body_bytes,
        )
    }

    /// JSON structured format; built by hand, the fields are flat and small
    fn format_json(&self) -> String {
        let user_agent = self.user_agent.as_ref().map_or_else(
            || "null".to_string(),
            |ua| format!("\"{}\"", escape_json(ua)),
        );
        format!(
            "{{\"time\":\"{}\",\"remote_addr\":\"{}\",\"method\":\"{}\",\"path\":\"{}\",\"status\":{},\"body_bytes\":{},\"user_agent\":{}}}",
            self.time.format("%Y-%m-%dT%H:%M:%S%z"),
            escape_json(&self.remote_addr),
            self.method,
            escape_json(&self.path),
            self.status,
            self.body_bytes,
            user_agent,
        )
    }
}

fn escape_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

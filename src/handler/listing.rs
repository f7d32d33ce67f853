//! Directory listing module
//!
//! Renders the media index as a minimal HTML page of links. Opt-in via
//! `media.directory_listing`; the default answer for a directory without an
//! index file is 404.

use crate::media::MediaIndex;

/// Render the listing page for every file the index knows about.
pub fn render(index: &MediaIndex) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Media Files</title></head>\n<body>\n<h1>Media Files</h1>\n<ul>\n",
    );
    for rel in index.relative_paths() {
        html.push_str("<li><a href=\"/");
        html.push_str(&href_escape(&rel));
        html.push_str("\">");
        html.push_str(&html_escape(&rel));
        html.push_str("</a></li>\n");
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

/// Percent-escape href bytes outside the unreserved set, keeping `/`.
fn href_escape(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for b in path.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(char::from(b));
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

//! MIME type detection module
//!
//! Returns the corresponding Content-Type based on file extension, with
//! `application/octet-stream` as the fallback for anything unrecognized.
//! Lookup is case-insensitive on the extension.

/// Get MIME Content-Type based on file extension
///
/// # Examples
/// ```
/// use mserve::http::mime::content_type;
/// assert_eq!(content_type(Some("mp3")), "audio/mpeg");
/// assert_eq!(content_type(Some("MP4")), "video/mp4");
/// assert_eq!(content_type(None), "application/octet-stream");
/// ```
pub fn content_type(extension: Option<&str>) -> &'static str {
    let lower = extension.map(str::to_ascii_lowercase);
    match lower.as_deref() {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",

        // JavaScript
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg" | "ogv") => "video/ogg",
        Some("mov") => "video/quicktime",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",

        // Audio
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",

        // Default
        _ => "application/octet-stream",
    }
}

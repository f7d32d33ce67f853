//! Path resolution module
//!
//! Maps a request path onto the media root and refuses anything that would
//! escape it. Escapes are reported as not-found rather than as a distinct
//! error: the root is a security boundary, not a user-facing distinction.

use std::path::{Component, Path, PathBuf};

use crate::http::mime;
use crate::logger;

/// Outcome of resolving one request path. Resolved freshly per request, so
/// it always reflects filesystem state at request time.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Canonical filesystem path; empty when `exists` is false.
    pub path: PathBuf,
    pub exists: bool,
    /// True when the request named a directory that had no index file; the
    /// caller may opt into rendering a listing instead of a 404.
    pub is_dir: bool,
    pub length: u64,
    pub content_type: &'static str,
}

impl ResolvedTarget {
    fn missing(is_dir: bool) -> Self {
        Self {
            path: PathBuf::new(),
            exists: false,
            is_dir,
            length: 0,
            content_type: mime::content_type(None),
        }
    }
}

/// Resolve `request_path` against the canonicalized media root.
///
/// Percent-decodes the path, drops any query string, strips the leading
/// slash, and joins onto the root. A directory resolves through the
/// configured index file list. Traversal is rejected twice: lexically
/// (`..` components in the decoded path) and again after canonicalization,
/// which also pins down symlinks.
pub fn resolve(root: &Path, request_path: &str, index_files: &[String]) -> ResolvedTarget {
    // Query strings never name bytes on disk
    let raw_path = request_path.split('?').next().unwrap_or(request_path);
    let decoded = percent_decode(raw_path);
    let relative = decoded.trim_start_matches('/');

    if Path::new(relative)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        logger::log_warning(&format!("path traversal attempt blocked: {request_path}"));
        return ResolvedTarget::missing(false);
    }

    let mut path = root.join(relative);

    if path.is_dir() {
        match index_files.iter().map(|f| path.join(f)).find(|p| p.is_file()) {
            Some(index) => path = index,
            None => return ResolvedTarget::missing(true),
        }
    }

    // Canonicalization fails for absent files, which is the common 404 case
    let Ok(canonical) = path.canonicalize() else {
        return ResolvedTarget::missing(false);
    };
    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "path traversal attempt blocked: {} -> {}",
            request_path,
            canonical.display()
        ));
        return ResolvedTarget::missing(false);
    }

    let Ok(meta) = canonical.metadata() else {
        return ResolvedTarget::missing(false);
    };
    if !meta.is_file() {
        return ResolvedTarget::missing(false);
    }

    let content_type = mime::content_type(canonical.extension().and_then(|e| e.to_str()));
    ResolvedTarget {
        path: canonical,
        exists: true,
        is_dir: false,
        length: meta.len(),
        content_type,
    }
}

/// Percent-decode a URL path (handles %XX sequences). Invalid sequences are
/// kept literally rather than rejected.
fn percent_decode(s: &str) -> String {
    let mut result = Vec::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(
                std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or(""),
                16,
            ) {
                result.push(byte);
                i += 3;
                continue;
            }
        }
        result.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&result).into_owned()
}

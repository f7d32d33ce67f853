//! HTTP Range request resolution module
//!
//! Resolves a single-range `bytes=` header against a known file length,
//! compliant with RFC 7233. Multi-range requests are not supported.

/// A concrete byte interval to serve, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte position
    pub start: u64,
    /// Last byte position, `length - 1` for full content
    pub end: u64,
    /// Whether the client asked for a range (response is 206 vs 200)
    pub is_partial: bool,
}

impl ByteRange {
    /// The full-content range for a file of `length` bytes.
    pub fn full(length: u64) -> Self {
        Self {
            start: 0,
            end: length.saturating_sub(1),
            is_partial: false,
        }
    }

    /// Number of body bytes this range selects from a file of `length` bytes.
    pub fn byte_count(&self, length: u64) -> u64 {
        if length == 0 {
            0
        } else {
            self.end - self.start + 1
        }
    }
}

/// Range resolution failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// No byte of the requested range lies within the file - answer 416
    /// with `Content-Range: bytes */<length>` and no body.
    Unsatisfiable,
}

/// Resolve an optional `Range` header against the file length.
///
/// Supported forms:
/// - `bytes=start-end` - explicit interval, `end` clamped to `length - 1`
/// - `bytes=start-` - from `start` through end of file
/// - `bytes=-suffix` - the last `suffix` bytes
///
/// No header, an unknown unit, a multi-range header, or malformed syntax all
/// degrade to the full-content range: range support is an optional
/// enhancement and never fails a request on its own.
///
/// # Examples
/// ```
/// use mserve::http::range::resolve_range;
///
/// let range = resolve_range(Some("bytes=200-299"), 1000).unwrap();
/// assert_eq!((range.start, range.end, range.is_partial), (200, 299, true));
///
/// let full = resolve_range(None, 1000).unwrap();
/// assert_eq!((full.start, full.end, full.is_partial), (0, 999, false));
/// ```
pub fn resolve_range(header: Option<&str>, length: u64) -> Result<ByteRange, RangeError> {
    let Some(header) = header else {
        return Ok(ByteRange::full(length));
    };

    let Some(spec) = header.strip_prefix("bytes=") else {
        return Ok(ByteRange::full(length)); // not a bytes unit, ignore
    };

    // Multi-range is not recognized and is treated as absent
    if spec.contains(',') {
        return Ok(ByteRange::full(length));
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return Ok(ByteRange::full(length));
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    let parsed = if start_str.is_empty() {
        parse_suffix(end_str, length)
    } else {
        parse_bounded(start_str, end_str, length)
    };

    let Some((start, end)) = parsed else {
        return Ok(ByteRange::full(length)); // malformed, serve full content
    };

    if length == 0 || start > end || start >= length {
        return Err(RangeError::Unsatisfiable);
    }

    // An overshooting end is satisfiable, just truncated
    Ok(ByteRange {
        start,
        end: end.min(length - 1),
        is_partial: true,
    })
}

/// Suffix form `-N`: the last N bytes. N larger than the file clamps to the
/// whole file; N = 0 produces `start == length` and fails validation above.
fn parse_suffix(suffix_str: &str, length: u64) -> Option<(u64, u64)> {
    let suffix = suffix_str.parse::<u64>().ok()?;
    Some((length.saturating_sub(suffix), length.saturating_sub(1)))
}

/// `start-end` or open-ended `start-`.
fn parse_bounded(start_str: &str, end_str: &str, length: u64) -> Option<(u64, u64)> {
    let start = start_str.parse::<u64>().ok()?;
    let end = if end_str.is_empty() {
        length.saturating_sub(1)
    } else {
        end_str.parse::<u64>().ok()?
    };
    Some((start, end))
}

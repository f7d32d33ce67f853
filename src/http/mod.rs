//! HTTP protocol layer module
//!
//! The slice of HTTP/1.1 this server speaks: request-line and header
//! parsing, Range resolution, MIME lookup, and response framing. Decoupled
//! from path resolution and the connection machinery.

pub mod mime;
pub mod range;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use range::{resolve_range, ByteRange, RangeError};
pub use request::{Method, Request};

//! mserve - a minimal HTTP/1.1 server that streams media files to browser
//! clients, with single-range partial content so players can seek without
//! downloading the whole file.
//!
//! The crate is split into the protocol layer (`http`), path resolution and
//! listing (`handler`), the media file index (`media`), and the listener /
//! per-connection machinery (`server`).

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod media;
pub mod server;

// Application state module
// Read-only configuration shared by all handlers, plus the reload-protected
// media index

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use tokio::sync::{Notify, RwLock};

use super::types::Config;
use crate::media::MediaIndex;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonicalized media root; the security boundary for path resolution.
    /// Never mutated after startup, safe for unsynchronized reads.
    pub media_root: PathBuf,
    /// Replaced wholesale on reload, read by the listing renderer
    pub index: RwLock<MediaIndex>,
    /// Stops the accept loop; in-flight handlers run to completion
    pub shutdown: Notify,

    // Cached config value for lock-free access on the hot path
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, media_root: PathBuf, index: MediaIndex) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            media_root,
            index: RwLock::new(index),
            shutdown: Notify::new(),
            cached_access_log,
        }
    }
}

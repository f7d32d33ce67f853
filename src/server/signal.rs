// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGHUP:  Rebuild the media index

use std::sync::Arc;

use crate::config::AppState;

/// Start the signal handler task (Unix).
///
/// SIGTERM/SIGINT fire the shutdown notify consumed by the accept loop;
/// SIGHUP rescans the media root and swaps the index wholesale. A rescan
/// failure keeps the previous index.
#[cfg(unix)]
pub fn start_signal_handler(state: Arc<AppState>) {
    use tokio::signal::unix::{signal, SignalKind};

    use crate::logger;
    use crate::media::MediaIndex;

    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");
        let mut sighup = signal(SignalKind::hangup()).expect("Failed to register SIGHUP handler");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    state.shutdown.notify_one();
                    break;
                }
                _ = sigint.recv() => {
                    state.shutdown.notify_one();
                    break;
                }
                _ = sighup.recv() => {
                    match MediaIndex::scan(&state.media_root) {
                        Ok(index) => {
                            let files = index.len();
                            *state.index.write().await = index;
                            logger::log_index_rebuilt(files);
                        }
                        Err(e) => {
                            logger::log_error(&format!("Media index rescan failed: {e}"));
                        }
                    }
                }
            }
        }
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(state: Arc<AppState>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            state.shutdown.notify_one();
        }
    });
}

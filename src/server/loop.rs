// Server loop module
// Accepts connections until the shutdown signal fires

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Accept connections and dispatch each to its own task until the state's
/// shutdown signal fires. Accepting never waits on a handler; handlers
/// already in flight run to completion after the loop exits.
pub async fn run(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = state.shutdown.notified() => {
                logger::log_shutdown_requested();
                break;
            }
        }
    }

    // Dropping the listener closes the listening socket; spawned handlers
    // keep their own streams and finish on their own schedule
    drop(listener);
    Ok(())
}

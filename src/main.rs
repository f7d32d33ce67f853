use std::path::Path;
use std::sync::Arc;

use mserve::config::{AppState, Config};
use mserve::logger;
use mserve::media::MediaIndex;
use mserve::server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.socket_addr()?;

    let media_root = Path::new(&cfg.media.root)
        .canonicalize()
        .map_err(|e| format!("Media root '{}' is not accessible: {e}", cfg.media.root))?;
    let index = MediaIndex::scan(&media_root)?;

    // Bind failure aborts startup entirely; there is no retry
    let listener = server::create_reusable_listener(addr)?;

    logger::log_server_start(&addr, &cfg, index.len());

    let state = Arc::new(AppState::new(cfg, media_root, index));
    server::signal::start_signal_handler(Arc::clone(&state));

    server::run(listener, state).await?;

    logger::log_server_stop();
    Ok(())
}

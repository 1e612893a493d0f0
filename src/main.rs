use std::process::ExitCode;
use std::sync::Arc;

mod config;
mod handler;
mod http;
mod logger;
mod server;

use handler::{runtime_config, static_files};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_fatal(e.as_ref());
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load()?;
    logger::init(&cfg)?;

    // Build the Tokio runtime, sizing the worker pool from configuration
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let asset_root = cfg.asset_root()?;
    let addr = cfg.get_socket_addr()?;

    if let Err(problem) = runtime_config::check_api_url(&cfg.runtime.api_url) {
        logger::log_warning(&format!(
            "{} {}; /config.js will assign an empty string",
            config::API_URL_ENV,
            problem.describe()
        ));
    }

    let entry = cfg
        .assets
        .entry
        .strip_prefix(cfg.assets.mount.trim_end_matches('/'))
        .unwrap_or(&cfg.assets.entry);
    if static_files::load_asset(&asset_root, entry, &cfg.assets.index_files)
        .await
        .is_none()
    {
        logger::log_warning(&format!(
            "Entry point {} not found under {}",
            cfg.assets.entry,
            asset_root.display()
        ));
    }

    let listener = server::create_listener(addr)
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;

    logger::log_server_start(&addr, &cfg, &asset_root);

    let state = Arc::new(config::AppState::new(&cfg, asset_root));
    server::start_server_loop(listener, state).await?;

    logger::log_info("Server stopped");
    Ok(())
}

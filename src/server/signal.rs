// Signal handling module
//
// SIGTERM and SIGINT stop the accept loop so the process exits with status 0
// when the platform stops the container. Without an explicit handler a
// process running as PID 1 ignores SIGTERM.

use crate::logger;

/// Resolve once the process has been asked to stop
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => logger::log_info("SIGTERM received, shutting down"),
        _ = sigint.recv() => logger::log_info("SIGINT received, shutting down"),
    }
    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    logger::log_info("Ctrl+C received, shutting down");
    Ok(())
}

// Server loop module
// Accepts connections until a shutdown signal arrives

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::shutdown_signal;
use crate::config::AppState;
use crate::logger;

/// Pause after a failed accept (e.g. file descriptor exhaustion)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Run the accept loop until SIGTERM/SIGINT or a signal registration failure
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }

            result = &mut shutdown => {
                result?;
                return Ok(());
            }
        }
    }
}

/// Accept loop without signal handling, for tests
#[cfg(test)]
pub async fn accept_forever(listener: TcpListener, state: Arc<AppState>) {
    loop {
        if let Ok((stream, peer_addr)) = listener.accept().await {
            accept_connection(stream, peer_addr, &state);
        }
    }
}

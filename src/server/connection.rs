// Connection handling module
// Serves one accepted TCP connection with hyper's HTTP/1 driver

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::AppState;
use crate::handler;
use crate::logger::{self, AccessLogEntry};

/// Spawn a task serving `stream` until the client closes it.
pub fn accept_connection(stream: tokio::net::TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) {
    if let Err(e) = stream.set_nodelay(true) {
        logger::log_debug(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }

    let state = Arc::clone(state);
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let performance = &state.config.performance;

        let mut builder = http1::Builder::new();
        builder
            .keep_alive(performance.keep_alive)
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.request_timeout));

        let service_state = Arc::clone(&state);
        let service = service_fn(move |req: Request<Incoming>| {
            let state = Arc::clone(&service_state);
            async move {
                let started = Instant::now();
                let entry = state
                    .config
                    .logging
                    .access_log
                    .then(|| begin_access_entry(&req, peer_addr));

                let resp = handler::handle_request(req, Arc::clone(&state)).await?;

                if let Some(mut entry) = entry {
                    entry.status = resp.status().as_u16();
                    entry.body_bytes = resp
                        .body()
                        .size_hint()
                        .exact()
                        .and_then(|n| usize::try_from(n).ok())
                        .unwrap_or(0);
                    entry.request_time_us =
                        u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
                    logger::log_access(&entry, &state.config.logging.access_log_format);
                }

                Ok::<_, Infallible>(resp)
            }
        });

        if let Err(err) = builder.serve_connection(io, service).await {
            logger::log_connection_error(&err);
        }
    });
}

/// Capture the request side of an access log line
fn begin_access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: hyper::header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header(hyper::header::REFERER);
    entry.user_agent = header(hyper::header::USER_AGENT);
    entry
}

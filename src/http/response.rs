//! HTTP response building module
//!
//! Provides builders for the status codes the server emits. Every builder
//! falls back to an empty response instead of panicking.

use super::cache::CachePolicy;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// Body content for HEAD-aware builders
fn body_for(data: Bytes, is_head: bool) -> Bytes {
    if is_head {
        Bytes::new()
    } else {
        data
    }
}

/// Build 200 OK response carrying a cache policy
///
/// `etag` is only sent for policies that allow revalidation.
pub fn build_ok_response(
    data: Bytes,
    content_type: &str,
    policy: CachePolicy,
    etag: Option<&str>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length);

    if let Some(etag) = etag.filter(|_| policy.allows_revalidation()) {
        builder = builder.header("ETag", etag);
    }

    policy
        .apply(builder)
        .body(Full::new(body_for(data, is_head)))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build JSON response
pub fn build_json_response(value: &serde_json::Value, is_head: bool) -> Response<Full<Bytes>> {
    let json = value.to_string();
    let content_length = json.len();

    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .header("Content-Length", content_length)
        .body(Full::new(body_for(Bytes::from(json), is_head)))
        .unwrap_or_else(|e| {
            log_build_error("JSON", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<Full<Bytes>> {
    CachePolicy::Revalidate
        .apply(Response::builder().status(304).header("ETag", etag))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 302 redirect response that is never cached
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    build_redirect_with_status(302, target)
}

/// Build 301 redirect response, used to add the trailing slash to directories
pub fn build_moved_permanently_response(target: &str) -> Response<Full<Bytes>> {
    build_redirect_with_status(301, target)
}

fn build_redirect_with_status(status: u16, target: &str) -> Response<Full<Bytes>> {
    CachePolicy::NoStore
        .apply(
            Response::builder()
                .status(status)
                .header("Location", target)
                .header("Content-Type", "text/plain"),
        )
        .body(Full::new(Bytes::from("Redirecting...")))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            Response::new(Full::new(Bytes::from("Redirecting...")))
        })
}

/// Build 404 Not Found response
///
/// The policy of the requested path still applies, so a missing page is not
/// cached by intermediaries either.
pub fn build_404_response(policy: CachePolicy) -> Response<Full<Bytes>> {
    policy
        .apply(
            Response::builder()
                .status(404)
                .header("Content-Type", "text/plain"),
        )
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD")
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

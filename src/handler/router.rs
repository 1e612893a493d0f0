//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, then
//! dispatch to the health check, the config script, the root redirect or
//! the static bundle.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, mime, CachePolicy};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

pub const HEALTH_PATH: &str = "/health";
pub const CONFIG_SCRIPT_PATH: &str = "/config.js";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    /// Raw query string, carried into redirects
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
}

/// Main entry point for HTTP request handling
///
/// Generic over the body type; no route reads the request body.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, _) = req.into_parts();

    if let Some(resp) = check_http_method(&parts.method) {
        return Ok(resp);
    }

    let ctx = RequestContext {
        path: parts.uri.path(),
        query: parts.uri.query(),
        is_head: parts.method == Method::HEAD,
        if_none_match: parts
            .headers
            .get(hyper::header::IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok()),
    };

    Ok(route_request(&ctx, &state).await)
}

/// Only GET and HEAD are served
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => Some(http::build_405_response()),
    }
}

/// Route request based on path
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let assets = &state.config.assets;

    match ctx.path {
        HEALTH_PATH => http::build_json_response(&serde_json::json!({ "ok": true }), ctx.is_head),
        CONFIG_SCRIPT_PATH => http::build_ok_response(
            Bytes::from(state.config_script.clone()),
            mime::JAVASCRIPT,
            CachePolicy::NoStore,
            None,
            ctx.is_head,
        ),
        "/" => http::build_redirect_response(&assets.entry),
        path => {
            let relative = strip_mount(path, &assets.mount).unwrap_or(path);
            static_files::serve_asset(ctx, &state.asset_root, relative, &assets.index_files).await
        }
    }
}

/// Remove the bundle mount prefix, matching whole segments only
fn strip_mount<'a>(path: &'a str, mount: &str) -> Option<&'a str> {
    let mount = mount.trim_end_matches('/');
    if mount.is_empty() {
        return None;
    }
    let rest = path.strip_prefix(mount)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, EnvOverrides};
    use crate::http::cache::NO_STORE;
    use http_body_util::{BodyExt, Empty};
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn fixture(api_url: Option<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("buyer")).unwrap();
        fs::create_dir_all(root.join("img")).unwrap();
        fs::write(root.join("buyer/index.html"), "<h1>buyer</h1>").unwrap();
        fs::write(root.join("buyer/orders.html"), "<h1>orders</h1>").unwrap();
        fs::write(root.join("buyer/my logo.png"), "png").unwrap();
        fs::write(root.join("img/logo.svg"), "<svg/>").unwrap();

        let overrides = EnvOverrides {
            api_url: api_url.map(ToString::to_string),
            ..EnvOverrides::default()
        };
        let config = Config::load_from("no-such-config-file", &overrides).unwrap();
        Fixture {
            _dir: dir,
            state: Arc::new(AppState::new(&config, root)),
        }
    }

    async fn send(state: &Arc<AppState>, method: Method, uri: &str) -> Response<Full<Bytes>> {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::<Bytes>::new())
            .unwrap();
        handle_request(req, Arc::clone(state)).await.unwrap()
    }

    async fn get(state: &Arc<AppState>, uri: &str) -> Response<Full<Bytes>> {
        send(state, Method::GET, uri).await
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_no_store(resp: &Response<Full<Bytes>>) {
        let headers = resp.headers();
        let cache_control = headers["Cache-Control"].to_str().unwrap();
        assert_eq!(cache_control, NO_STORE);
        assert!(cache_control.contains("no-store"));
        assert!(!cache_control.contains("max-age"));
        assert_eq!(headers["Pragma"], "no-cache");
        assert_eq!(headers["Expires"], "0");
        assert_eq!(headers["Surrogate-Control"], "no-store");
    }

    #[tokio::test]
    async fn test_config_script_with_api_url() {
        let f = fixture(Some("https://api.example.com"));
        let resp = get(&f.state, "/config.js").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "application/javascript");
        assert_no_store(&resp);
        assert_eq!(
            body_string(resp).await,
            r#"window.FOODY_API = "https://api.example.com";"#
        );
    }

    #[tokio::test]
    async fn test_config_script_without_api_url() {
        let f = fixture(None);
        let resp = get(&f.state, "/config.js").await;
        assert_eq!(resp.status(), 200);
        assert_no_store(&resp);
        let body = body_string(resp).await;
        assert!(body.contains("console.warn("));
        assert!(body.ends_with("window.FOODY_API = \"\";"));
    }

    #[tokio::test]
    async fn test_root_redirects_to_buyer() {
        for api_url in [None, Some("https://api.example.com"), Some("garbage")] {
            let f = fixture(api_url);
            let resp = get(&f.state, "/").await;
            assert_eq!(resp.status(), 302);
            assert_eq!(resp.headers()["Location"], "/web/buyer/");
            assert_no_store(&resp);
        }
    }

    #[tokio::test]
    async fn test_health() {
        let f = fixture(None);
        let resp = get(&f.state, "/health").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        assert_eq!(body_string(resp).await, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_health_without_asset_root() {
        let f = fixture(None);
        let root = f.state.asset_root.clone();
        fs::remove_dir_all(&root).unwrap();
        let resp = get(&f.state, "/health").await;
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_static_html_is_not_cached() {
        let f = fixture(None);
        let resp = get(&f.state, "/web/buyer/index.html").await;
        assert_eq!(resp.status(), 200);
        assert_no_store(&resp);
        assert!(resp.headers().get("ETag").is_none());
        assert_eq!(body_string(resp).await, "<h1>buyer</h1>");
    }

    #[tokio::test]
    async fn test_directory_and_extensionless_pages() {
        let f = fixture(None);
        for uri in ["/web/buyer/", "/buyer/", "/web/buyer/?ref=bot"] {
            let resp = get(&f.state, uri).await;
            assert_eq!(resp.status(), 200, "uri {uri}");
            assert_no_store(&resp);
            assert_eq!(body_string(resp).await, "<h1>buyer</h1>");
        }

        let resp = get(&f.state, "/web/buyer/orders?tab=open").await;
        assert_eq!(resp.status(), 200);
        assert_no_store(&resp);
        assert_eq!(body_string(resp).await, "<h1>orders</h1>");
    }

    #[tokio::test]
    async fn test_directory_without_slash_redirects() {
        let f = fixture(None);
        for (uri, location) in [
            ("/web/buyer", "/web/buyer/"),
            ("/buyer", "/buyer/"),
            ("/web/buyer?ref=bot", "/web/buyer/?ref=bot"),
        ] {
            let resp = get(&f.state, uri).await;
            assert_eq!(resp.status(), 301, "uri {uri}");
            assert_eq!(resp.headers()["Location"], location);
            assert_no_store(&resp);
        }
    }

    #[tokio::test]
    async fn test_missing_asset_is_404() {
        let f = fixture(None);
        assert_eq!(get(&f.state, "/web/doesnotexist").await.status(), 404);
        assert_eq!(get(&f.state, "/nope.png").await.status(), 404);
        assert_eq!(get(&f.state, "/web/../secret").await.status(), 404);
        assert_eq!(get(&f.state, "/web/%2e%2e/secret").await.status(), 404);
    }

    #[tokio::test]
    async fn test_missing_html_page_is_not_cached() {
        let f = fixture(None);
        let resp = get(&f.state, "/web/buyer/missing.html").await;
        assert_eq!(resp.status(), 404);
        assert_no_store(&resp);
    }

    #[tokio::test]
    async fn test_percent_encoded_asset() {
        let f = fixture(None);
        let resp = get(&f.state, "/web/buyer/my%20logo.png").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "image/png");
        assert_eq!(body_string(resp).await, "png");
    }

    #[tokio::test]
    async fn test_asset_revalidation() {
        let f = fixture(None);
        let resp = get(&f.state, "/web/img/logo.svg").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Cache-Control"], "public, max-age=0");
        assert_eq!(resp.headers()["Content-Type"], "image/svg+xml");
        let etag = resp.headers()["ETag"].to_str().unwrap().to_string();

        let req = Request::builder()
            .uri("/web/img/logo.svg")
            .header("If-None-Match", &etag)
            .body(Empty::<Bytes>::new())
            .unwrap();
        let resp = handle_request(req, Arc::clone(&f.state)).await.unwrap();
        assert_eq!(resp.status(), 304);
    }

    #[tokio::test]
    async fn test_head_has_headers_but_no_body() {
        let f = fixture(Some("https://api.example.com"));
        let resp = send(&f.state, Method::HEAD, "/config.js").await;
        assert_eq!(resp.status(), 200);
        assert_no_store(&resp);
        assert_eq!(
            resp.headers()["Content-Length"],
            r#"window.FOODY_API = "https://api.example.com";"#.len().to_string().as_str()
        );
        assert_eq!(body_string(resp).await, "");
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let f = fixture(None);
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let resp = send(&f.state, method, "/config.js").await;
            assert_eq!(resp.status(), 405);
        }
    }

    #[test]
    fn test_strip_mount() {
        assert_eq!(strip_mount("/web/buyer/", "/web"), Some("/buyer/"));
        assert_eq!(strip_mount("/web", "/web"), Some(""));
        assert_eq!(strip_mount("/web/", "/web/"), Some("/"));
        assert_eq!(strip_mount("/website/x", "/web"), None);
        assert_eq!(strip_mount("/buyer/", "/web"), None);
        assert_eq!(strip_mount("/buyer/", ""), None);
    }
}

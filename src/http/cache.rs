//! HTTP cache control module
//!
//! Decides which responses must never be cached and provides `ETag`
//! generation and conditional request handling for the rest.

use hyper::http::response::Builder;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// `Cache-Control` value for pages and the runtime config script
pub const NO_STORE: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";

/// `Cache-Control` value for other static assets
pub const REVALIDATE: &str = "public, max-age=0";

/// Cache control policy attached to a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Forbid every browser, proxy and CDN cache from keeping a copy
    NoStore,
    /// Cacheable, but must be revalidated with the `ETag` on every use
    Revalidate,
}

impl CachePolicy {
    /// Select the policy for a request path and the file that answered it
    ///
    /// `served_file` is the resolved file name when the request was answered
    /// from disk; a directory index or an extension-less page is still HTML.
    pub fn for_path(path: &str, served_file: Option<&str>) -> Self {
        let html_file = served_file.is_some_and(has_html_extension);
        if path == "/" || path == "/config.js" || has_html_extension(path) || html_file {
            Self::NoStore
        } else {
            Self::Revalidate
        }
    }

    /// Convert to Cache-Control header value
    pub const fn to_header_value(self) -> &'static str {
        match self {
            Self::NoStore => NO_STORE,
            Self::Revalidate => REVALIDATE,
        }
    }

    /// Whether conditional requests may be answered with 304
    pub const fn allows_revalidation(self) -> bool {
        matches!(self, Self::Revalidate)
    }

    /// Add the policy's headers to a response builder
    pub fn apply(self, builder: Builder) -> Builder {
        let builder = builder.header("Cache-Control", self.to_header_value());
        match self {
            Self::NoStore => builder
                .header("Pragma", "no-cache")
                .header("Expires", "0")
                .header("Surrogate-Control", "no-store"),
            Self::Revalidate => builder,
        }
    }
}

fn has_html_extension(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Generate `ETag` using fast hashing
///
/// Returns a quoted string, e.g. `"abc123def"`.
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    let v = hasher.finish();
    format!("\"{v:x}\"")
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Accepts a single tag, a comma separated list, weak tags and `*`.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').map(str::trim).any(|e| {
            e == "*" || e == etag || e.strip_prefix("W/") == Some(etag)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Response;

    #[test]
    fn test_no_store_paths() {
        assert_eq!(CachePolicy::for_path("/", None), CachePolicy::NoStore);
        assert_eq!(CachePolicy::for_path("/config.js", None), CachePolicy::NoStore);
        assert_eq!(
            CachePolicy::for_path("/web/buyer/index.html", None),
            CachePolicy::NoStore
        );
        assert_eq!(
            CachePolicy::for_path("/web/buyer/", Some("index.html")),
            CachePolicy::NoStore
        );
        assert_eq!(
            CachePolicy::for_path("/web/buyer/cart", Some("cart.html")),
            CachePolicy::NoStore
        );
    }

    #[test]
    fn test_assets_revalidate() {
        assert_eq!(
            CachePolicy::for_path("/web/buyer/app.js", Some("app.js")),
            CachePolicy::Revalidate
        );
        assert_eq!(
            CachePolicy::for_path("/web/img/logo.png", Some("logo.png")),
            CachePolicy::Revalidate
        );
        // Only the exact config script path is special
        assert_eq!(
            CachePolicy::for_path("/web/config.json", Some("config.json")),
            CachePolicy::Revalidate
        );
    }

    #[test]
    fn test_apply_no_store_headers() {
        let resp = CachePolicy::NoStore
            .apply(Response::builder())
            .body(())
            .unwrap();
        let headers = resp.headers();
        assert_eq!(headers["Cache-Control"], NO_STORE);
        assert_eq!(headers["Pragma"], "no-cache");
        assert_eq!(headers["Expires"], "0");
        assert_eq!(headers["Surrogate-Control"], "no-store");
        assert!(!NO_STORE.contains("max-age"));
    }

    #[test]
    fn test_apply_revalidate_headers() {
        let resp = CachePolicy::Revalidate
            .apply(Response::builder())
            .body(())
            .unwrap();
        assert_eq!(resp.headers()["Cache-Control"], REVALIDATE);
        assert!(resp.headers().get("Pragma").is_none());
        assert!(CachePolicy::Revalidate.allows_revalidation());
        assert!(!CachePolicy::NoStore.allows_revalidation());
    }

    #[test]
    fn test_etag_consistency() {
        let etag = generate_etag(b"same content");
        assert!(etag.starts_with('"') && etag.ends_with('"'));
        assert_eq!(etag, generate_etag(b"same content"));
        assert_ne!(etag, generate_etag(b"other content"));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"abc123\"";
        assert!(check_etag_match(Some("\"abc123\""), etag));
        assert!(check_etag_match(Some("\"xyz\", \"abc123\""), etag));
        assert!(check_etag_match(Some("W/\"abc123\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"different\""), etag));
        assert!(!check_etag_match(None, etag));
    }
}

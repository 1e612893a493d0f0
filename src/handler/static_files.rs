//! Static file serving module
//!
//! Resolves request paths against the asset root and builds file responses.
//!
//! Path segments are percent-decoded before they touch the filesystem.
//!
//! Resolution order for a relative path `p`:
//! 1. `p` is a directory: the first configured index file inside it
//!    (a request without the trailing slash is redirected to add it)
//! 2. `p` is a file: that file
//! 3. `p` has no extension: `p.html`
//!
//! Anything that resolves outside the asset root is treated as missing.

use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, CachePolicy};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A file loaded from the asset root
#[derive(Debug)]
pub struct Asset {
    pub content: Vec<u8>,
    pub content_type: &'static str,
    /// File name of the resolved path (e.g. `index.html` for a directory)
    pub file_name: String,
    /// Served as the index file of a directory
    pub directory_index: bool,
}

/// Serve `relative` from the asset root
pub async fn serve_asset(
    ctx: &RequestContext<'_>,
    asset_root: &Path,
    relative: &str,
    index_files: &[String],
) -> Response<Full<Bytes>> {
    let Some(asset) = load_asset(asset_root, relative, index_files).await else {
        logger::log_debug(&format!("No asset for {}", ctx.path));
        return http::build_404_response(CachePolicy::for_path(ctx.path, None));
    };

    if asset.directory_index && !ctx.path.ends_with('/') {
        return http::build_moved_permanently_response(&with_trailing_slash(ctx.path, ctx.query));
    }

    let policy = CachePolicy::for_path(ctx.path, Some(&asset.file_name));
    let etag = cache::generate_etag(&asset.content);

    if policy.allows_revalidation() && cache::check_etag_match(ctx.if_none_match, &etag) {
        return http::build_304_response(&etag);
    }

    http::build_ok_response(
        Bytes::from(asset.content),
        asset.content_type,
        policy,
        Some(etag.as_str()),
        ctx.is_head,
    )
}

/// Load a file from the asset root, applying index and `.html` fallbacks
pub async fn load_asset(
    asset_root: &Path,
    relative: &str,
    index_files: &[String],
) -> Option<Asset> {
    let candidate = join_relative(asset_root, relative)?;
    let (file_path, directory_index) = resolve_file(candidate, index_files).await?;

    // File not found is common (404), no need to log at warning level
    let canonical = fs::canonicalize(&file_path).await.ok()?;
    if !canonical.starts_with(asset_root) {
        logger::log_warning(&format!(
            "Path escapes asset root: {relative} -> {}",
            canonical.display()
        ));
        return None;
    }

    let content = match fs::read(&canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {e}",
                canonical.display()
            ));
            return None;
        }
    };

    let content_type = mime::get_content_type(file_path.extension().and_then(|e| e.to_str()));
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Some(Asset {
        content,
        content_type,
        file_name,
        directory_index,
    })
}

fn with_trailing_slash(path: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{path}/?{q}"),
        None => format!("{path}/"),
    }
}

/// Join a URL path onto the root, refusing parent-directory segments
///
/// Each segment is percent-decoded first, so `%2e%2e` is a parent segment
/// and `%2f` can not smuggle a separator into a file name.
fn join_relative(asset_root: &Path, relative: &str) -> Option<PathBuf> {
    let mut path = asset_root.to_path_buf();
    for raw in relative.split('/') {
        let Ok(segment) = percent_decode_str(raw).decode_utf8() else {
            logger::log_debug(&format!("Path segment is not UTF-8: {raw}"));
            return None;
        };
        match segment.as_ref() {
            "" | "." => {}
            ".." => {
                logger::log_warning(&format!("Path traversal attempt blocked: {relative}"));
                return None;
            }
            s if s.contains(|c: char| matches!(c, '/' | '\\' | '\0')) => {
                logger::log_warning(&format!("Encoded separator in path blocked: {relative}"));
                return None;
            }
            s => path.push(s),
        }
    }
    Some(path)
}

/// Pick the file that answers `candidate`, and whether it is a directory index
async fn resolve_file(candidate: PathBuf, index_files: &[String]) -> Option<(PathBuf, bool)> {
    match fs::metadata(&candidate).await {
        Ok(meta) if meta.is_dir() => {
            for index_file in index_files {
                let index_path = candidate.join(index_file);
                if is_file(&index_path).await {
                    return Some((index_path, true));
                }
            }
            None
        }
        Ok(meta) if meta.is_file() => Some((candidate, false)),
        _ if candidate.extension().is_none() => {
            let html = candidate.with_extension("html");
            is_file(&html).await.then_some((html, false))
        }
        _ => None,
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

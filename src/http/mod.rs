//! HTTP protocol layer module
//!
//! Cache policy, content types and response builders, independent of routing.

pub mod cache;
pub mod mime;
pub mod response;

pub use cache::CachePolicy;
pub use response::{
    build_304_response, build_404_response, build_405_response, build_json_response,
    build_moved_permanently_response, build_ok_response, build_redirect_response,
};

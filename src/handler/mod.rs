//! Request handler module
//!
//! Route dispatch, the generated runtime config script and static file serving.

pub mod router;
pub mod runtime_config;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;

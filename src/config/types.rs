// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub runtime: RuntimeConfig,
    pub assets: AssetsConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Values exposed to the browser through `/config.js`
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Backend base URL (`FOODY_API`)
    #[serde(default)]
    pub api_url: String,
    /// Name of the `window` property the script assigns
    pub global_name: String,
}

/// Static bundle configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// Directory holding the pre-built web application
    pub root: String,
    /// URL prefix the bundle is mounted under
    pub mount: String,
    /// Redirect target for `/`
    pub entry: String,
    pub index_files: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds a client has to send complete request headers
    pub request_timeout: u64,
}

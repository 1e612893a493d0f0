// Configuration module entry point
// Loads layered configuration and validates it before the server starts

mod state;
mod types;

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub use config::ConfigError;
pub use state::AppState;
pub use types::{Config, RuntimeConfig};

/// Environment variable carrying the backend base URL
pub const API_URL_ENV: &str = "FOODY_API";
/// Environment variable carrying the listen port
pub const PORT_ENV: &str = "PORT";
/// Environment variable overriding the asset root
pub const WEB_ROOT_ENV: &str = "WEB_ROOT";

/// Fatal problems detected before the listener is bound
#[derive(Debug)]
pub enum StartupError {
    AssetRootMissing(PathBuf),
    AssetRootNotDirectory(PathBuf),
    InvalidAddress(String),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetRootMissing(p) => write!(f, "Asset root not found: {}", p.display()),
            Self::AssetRootNotDirectory(p) => {
                write!(f, "Asset root is not a directory: {}", p.display())
            }
            Self::InvalidAddress(e) => write!(f, "Invalid address: {e}"),
        }
    }
}

impl std::error::Error for StartupError {}

/// Explicit overrides taken from well-known environment variables
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub api_url: Option<String>,
    pub port: Option<String>,
    pub web_root: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build overrides from any variable source; blank `PORT` and `WEB_ROOT` count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());
        Self {
            api_url: lookup(API_URL_ENV),
            port: non_blank(PORT_ENV),
            web_root: non_blank(WEB_ROOT_ENV),
        }
    }
}

impl Config {
    /// Load configuration from `config.toml` (optional) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config", &EnvOverrides::from_env())
    }

    /// Load configuration from specified file path (without extension)
    ///
    /// Precedence, lowest first: defaults, file, `WEB__SECTION__KEY` variables,
    /// then `overrides`.
    pub fn load_from(config_path: &str, overrides: &EnvOverrides) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("WEB").prefix_separator("__").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("runtime.api_url", "")?
            .set_default("runtime.global_name", "FOODY_API")?
            .set_default("assets.root", "web")?
            .set_default("assets.mount", "/web")?
            .set_default("assets.entry", "/web/buyer/")?
            .set_default("assets.index_files", vec!["index.html"])?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.request_timeout", 30)?
            .set_override_option("runtime.api_url", overrides.api_url.clone())?
            .set_override_option("server.port", overrides.port.clone())?
            .set_override_option("assets.root", overrides.web_root.clone())?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, StartupError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| StartupError::InvalidAddress(format!("{e}")))
    }

    /// Resolve the asset root to an absolute path, failing if it is unusable
    pub fn asset_root(&self) -> Result<PathBuf, StartupError> {
        let root = Path::new(&self.assets.root);
        let canonical = root
            .canonicalize()
            .map_err(|_| StartupError::AssetRootMissing(root.to_path_buf()))?;
        if !canonical.is_dir() {
            return Err(StartupError::AssetRootNotDirectory(canonical));
        }
        Ok(canonical)
    }
}

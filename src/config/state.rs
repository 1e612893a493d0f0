// Application state module
// Read-only values shared by every connection

use std::path::PathBuf;

use super::types::Config;
use crate::handler::runtime_config;

/// Application state
///
/// Built once at startup and shared through an `Arc`; nothing in it changes
/// while the server runs.
pub struct AppState {
    pub config: Config,
    /// Canonical asset root
    pub asset_root: PathBuf,
    /// Pre-rendered `/config.js` body
    pub config_script: String,
}

impl AppState {
    pub fn new(config: &Config, asset_root: PathBuf) -> Self {
        let config_script = runtime_config::render_script(&config.runtime);

        Self {
            config: config.clone(),
            asset_root,
            config_script,
        }
    }
}

//! Haven configuration system.
//!
//! TOML-based configuration for the assistant client. Every section uses
//! serde defaults, so a partial (or empty) config file works out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use haven_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config.api.base_url);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    ApiConfig, AuthConfig, DirectoryConfig, ExchangeConfig, HavenConfig, CONFIG_SCHEMA_VERSION,
};

use std::path::Path;

use haven_common::ConfigError;

/// Load config from `path`, or from the platform default path (creating a
/// default file if none exists). Validation problems are logged and the
/// parsed values kept, whichever file is read.
pub fn load_config(path: Option<&Path>) -> Result<HavenConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &HavenConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

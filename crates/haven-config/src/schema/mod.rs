//! Configuration schema types for Haven.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod api;
mod auth;
mod conversation;

pub use api::*;
pub use auth::*;
pub use conversation::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Haven.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HavenConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub exchange: ExchangeConfig,
    pub directory: DirectoryConfig,
}

//! Configuration validation.
//!
//! Each section has its own validator; this orchestrator collects every
//! problem into a single `ConfigError`.

mod helpers;
mod sections;


use crate::schema::HavenConfig;
use haven_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &HavenConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_api(&mut errors, config);
    sections::validate_auth(&mut errors, config);
    sections::validate_exchange(&mut errors, config);
    sections::validate_directory(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

//! Per-section validators.

use crate::schema::HavenConfig;

use super::helpers::validate_range;

pub(crate) fn validate_api(errors: &mut Vec<String>, config: &HavenConfig) {
    let api = &config.api;
    if !(api.base_url.starts_with("http://") || api.base_url.starts_with("https://")) {
        errors.push(format!(
            "api.base_url = {:?} must start with http:// or https://",
            api.base_url
        ));
    }
    if api.chat_path.trim().is_empty() {
        errors.push("api.chat_path must not be empty".into());
    }
    if api.sessions_path.trim().is_empty() {
        errors.push("api.sessions_path must not be empty".into());
    }
    validate_range(
        errors,
        "api.connect_timeout_secs",
        api.connect_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "api.stall_timeout_secs",
        api.stall_timeout_secs,
        1,
        600,
    );
}

pub(crate) fn validate_auth(errors: &mut Vec<String>, config: &HavenConfig) {
    if config.auth.token_env.trim().is_empty() {
        errors.push("auth.token_env must not be empty".into());
    }
}

pub(crate) fn validate_exchange(errors: &mut Vec<String>, config: &HavenConfig) {
    validate_range(
        errors,
        "exchange.complex_prompt_chars",
        config.exchange.complex_prompt_chars.into(),
        1,
        100_000,
    );
}

pub(crate) fn validate_directory(errors: &mut Vec<String>, config: &HavenConfig) {
    validate_range(
        errors,
        "directory.title_max_chars",
        config.directory.title_max_chars.into(),
        10,
        200,
    );
    validate_range(
        errors,
        "directory.preview_max_chars",
        config.directory.preview_max_chars.into(),
        10,
        500,
    );
}

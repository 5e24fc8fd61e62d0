//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Haven Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[api]
# base_url = "https://api.haven.chat/v1"
# chat_path = "/chat"
# sessions_path = "/sessions"
# connect_timeout_secs = 10   # 1-120
# stall_timeout_secs = 45     # 1-600

[auth]
# Environment variable holding the bearer token. Read on every request.
# token_env = "HAVEN_TOKEN"

[exchange]
# complex_prompt_chars = 280  # 1-100000

[directory]
# title_max_chars = 50        # 10-200
# preview_max_chars = 100     # 10-500
"##
    .to_string()
}

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HavenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("chat error: {0}")]
    Chat(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("api.stall_timeout_secs = 0".into());
        assert_eq!(
            err.to_string(),
            "config validation error: api.stall_timeout_secs = 0"
        );
    }

    #[test]
    fn haven_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: HavenError = config_err.into();
        assert!(matches!(err, HavenError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn haven_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let err: HavenError = io_err.into();
        assert!(matches!(err, HavenError::Io(_)));
        assert!(err.to_string().contains("stdout closed"));
    }

    #[test]
    fn haven_error_other_variants() {
        let err = HavenError::Chat("session is busy".into());
        assert_eq!(err.to_string(), "chat error: session is busy");

        let err = HavenError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}

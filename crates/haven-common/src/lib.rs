pub mod errors;
pub mod id;

pub use errors::{ConfigError, HavenError};
pub use id::{new_correlation_id, MessageId, SessionRef};

pub type Result<T> = std::result::Result<T, HavenError>;

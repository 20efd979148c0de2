use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid zone directory: {0}")]
    InvalidZoneDir(String),

    #[error("Invalid shard parameters: {0}")]
    InvalidShardParameters(String),

    #[error("Invalid shard signing key: {0}")]
    InvalidSigningKey(String),

    #[error("Invalid replay window: {0}")]
    InvalidReplayWindow(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

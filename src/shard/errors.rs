use crate::crypto::CryptoError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShardError {
    #[error("Invalid shard parameters: {0}")]
    InvalidParameters(String),

    #[error("Insufficient shards: have {have} data shards, need {need}")]
    InsufficientShards { have: usize, need: usize },

    #[error("Integrity check failed: reconstructed data does not match hash {expected}")]
    IntegrityFailure { expected: String },

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

pub type Result<T> = std::result::Result<T, ShardError>;

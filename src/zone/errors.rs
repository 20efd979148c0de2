use crate::shard::ShardError;
use thiserror::Error;

/// Zone-related errors
#[derive(Error, Debug, Clone)]
pub enum ZoneError {
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Record not found: {domain} {rtype} in zone {zone}")]
    RecordNotFound {
        zone: String,
        domain: String,
        rtype: String,
    },

    #[error("Zone already exists: {0}")]
    ZoneExists(String),

    #[error("Invalid zone name: {0}")]
    InvalidName(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Zone file exceeds maximum size")]
    FileTooLarge,

    #[error("Shard error: {0}")]
    Shard(#[from] ShardError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ZoneError {
    /// Zone or record absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ZoneNotFound(_) | Self::RecordNotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ZoneExists(_))
    }
}

impl From<std::io::Error> for ZoneError {
    fn from(err: std::io::Error) -> Self {
        ZoneError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ZoneError {
    fn from(err: serde_json::Error) -> Self {
        ZoneError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ZoneError>;

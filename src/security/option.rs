use super::errors::{Result, SecurityError};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// JSON payload of the signed EDNS option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOption {
    /// Base64 signature bytes
    pub signature: String,
    /// Signing time in epoch milliseconds, as a decimal string
    pub timestamp: String,
    pub algorithm: String,
}

impl SignedOption {
    pub fn new(signature: &[u8], timestamp_ms: i64, algorithm: &str) -> Self {
        Self {
            signature: STANDARD.encode(signature),
            timestamp: timestamp_ms.to_string(),
            algorithm: algorithm.to_string(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn timestamp_ms(&self) -> Result<i64> {
        self.timestamp
            .trim()
            .parse()
            .map_err(|_| SecurityError::MalformedOption(format!("timestamp {:?}", self.timestamp)))
    }

    pub fn signature_bytes(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.signature)
            .map_err(|e| SecurityError::MalformedOption(e.to_string()))
    }
}

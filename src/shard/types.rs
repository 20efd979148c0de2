use crate::crypto::SealedData;
use serde::{Deserialize, Serialize};

/// Integrity data attached to every shard of one payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// SHA-256 hex of the full original payload
    pub hash: String,
    pub total_size: usize,
    /// Encrypted snapshot of the whole payload (position 0 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_data: Option<SealedData>,
    /// Hex snapshot key (position 1 only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,
}

/// A contiguous chunk of the original payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataShard {
    pub id: String,
    pub position: usize,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub size: usize,
    /// Threshold: number of data shards in the set
    pub total: usize,
    pub verification: Verification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// XOR combination of several data shards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParityShard {
    pub id: String,
    pub position: usize,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub size: usize,
    /// Shard count of the whole set
    pub total: usize,
    pub source_positions: Vec<usize>,
    pub verification: Verification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shard {
    Data(DataShard),
    Parity(ParityShard),
}

impl Shard {
    pub fn id(&self) -> &str {
        match self {
            Shard::Data(s) => &s.id,
            Shard::Parity(s) => &s.id,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Shard::Data(s) => s.position,
            Shard::Parity(s) => s.position,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Shard::Data(s) => s.size,
            Shard::Parity(s) => s.size,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Shard::Data(s) => &s.data,
            Shard::Parity(s) => &s.data,
        }
    }

    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        match self {
            Shard::Data(s) => &mut s.data,
            Shard::Parity(s) => &mut s.data,
        }
    }

    pub fn verification(&self) -> &Verification {
        match self {
            Shard::Data(s) => &s.verification,
            Shard::Parity(s) => &s.verification,
        }
    }

    pub fn verification_mut(&mut self) -> &mut Verification {
        match self {
            Shard::Data(s) => &mut s.verification,
            Shard::Parity(s) => &mut s.verification,
        }
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            Shard::Data(s) => s.signature.as_deref(),
            Shard::Parity(s) => s.signature.as_deref(),
        }
    }

    pub fn set_signature(&mut self, signature: String) {
        match self {
            Shard::Data(s) => s.signature = Some(signature),
            Shard::Parity(s) => s.signature = Some(signature),
        }
    }

    pub fn is_parity(&self) -> bool {
        matches!(self, Shard::Parity(_))
    }

    /// Bytes covered by the shard HMAC: identity, size, position and payload hash
    pub fn signing_payload(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.id(),
            self.size(),
            self.position(),
            self.verification().hash
        )
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

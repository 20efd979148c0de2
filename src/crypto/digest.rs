use super::errors::{CryptoError, Result};
use ring::{digest, hmac};
use std::fmt;
use std::str::FromStr;

/// Hash algorithms available for content digests and HMACs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Get the algorithm name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    fn digest_algorithm(&self) -> &'static digest::Algorithm {
        match self {
            Self::Sha256 => &digest::SHA256,
            Self::Sha384 => &digest::SHA384,
            Self::Sha512 => &digest::SHA512,
        }
    }

    fn hmac_algorithm(&self) -> hmac::Algorithm {
        match self {
            Self::Sha256 => hmac::HMAC_SHA256,
            Self::Sha384 => hmac::HMAC_SHA384,
            Self::Sha512 => hmac::HMAC_SHA512,
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Hex-encoded digest of `data`
pub fn hash(data: &[u8], algorithm: HashAlgorithm) -> String {
    hex::encode(digest::digest(algorithm.digest_algorithm(), data))
}

/// Hex-encoded SHA-256 digest of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    hash(data, HashAlgorithm::Sha256)
}

/// Hex-encoded HMAC of `data` under `key`
pub fn hmac(data: &[u8], key: &[u8], algorithm: HashAlgorithm) -> String {
    let key = hmac::Key::new(algorithm.hmac_algorithm(), key);
    hex::encode(hmac::sign(&key, data))
}

/// Check a hex-encoded HMAC in constant time
pub fn verify_hmac(data: &[u8], key: &[u8], tag_hex: &str, algorithm: HashAlgorithm) -> bool {
    let Ok(tag) = hex::decode(tag_hex) else {
        return false;
    };
    let key = hmac::Key::new(algorithm.hmac_algorithm(), key);
    hmac::verify(&key, data, &tag).is_ok()
}

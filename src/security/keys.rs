use super::errors::{Result, SecurityError};
use crate::crypto::{KeyPair, SignatureScheme, default_scheme};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Key pair bound to the scheme that uses it
#[derive(Clone)]
pub struct SecurityKeys {
    key_pair: KeyPair,
    scheme: Arc<dyn SignatureScheme>,
}

/// On-disk form of a key pair, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFile {
    pub algorithm: String,
    pub public_key: String,
    pub private_key: String,
}

impl SecurityKeys {
    pub fn new(key_pair: KeyPair, scheme: Arc<dyn SignatureScheme>) -> Self {
        Self { key_pair, scheme }
    }

    /// Fresh key pair for the default scheme
    pub fn generate() -> Result<Self> {
        Self::generate_with(default_scheme())
    }

    pub fn generate_with(scheme: Arc<dyn SignatureScheme>) -> Result<Self> {
        let key_pair = scheme.generate_key_pair()?;
        Ok(Self { key_pair, scheme })
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn algorithm(&self) -> &'static str {
        self.scheme.algorithm()
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.scheme.sign(data, &self.key_pair.private_key)?)
    }

    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        self.scheme.verify(data, signature, &self.key_pair.public_key)
    }

    pub fn to_key_file(&self) -> KeyFile {
        KeyFile {
            algorithm: self.algorithm().to_string(),
            public_key: hex::encode(&self.key_pair.public_key),
            private_key: hex::encode(&self.key_pair.private_key),
        }
    }

    /// Keys for the default scheme from a decoded key file
    pub fn from_key_file(file: &KeyFile) -> Result<Self> {
        let scheme = default_scheme();
        if file.algorithm != scheme.algorithm() {
            return Err(SecurityError::KeyFile(format!(
                "unsupported algorithm {}",
                file.algorithm
            )));
        }

        let decode = |field: &str, value: &str| {
            hex::decode(value).map_err(|e| SecurityError::KeyFile(format!("{}: {}", field, e)))
        };
        let key_pair = KeyPair {
            public_key: decode("publicKey", &file.public_key)?,
            private_key: decode("privateKey", &file.private_key)?,
        };

        let keys = Self::new(key_pair, scheme);
        // Reject mismatched halves up front
        let probe = keys.sign(b"probe")?;
        if !keys.verify(b"probe", &probe) {
            return Err(SecurityError::KeyFile(
                "public key does not match private key".to_string(),
            ));
        }
        Ok(keys)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| SecurityError::KeyFile(format!("{}: {}", path.display(), e)))?;
        let file: KeyFile = serde_json::from_slice(&contents)
            .map_err(|e| SecurityError::KeyFile(format!("{}: {}", path.display(), e)))?;
        Self::from_key_file(&file)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_vec_pretty(&self.to_key_file())
            .map_err(|e| SecurityError::KeyFile(e.to_string()))?;
        tokio::fs::write(path, contents)
            .await
            .map_err(|e| SecurityError::KeyFile(format!("{}: {}", path.display(), e)))
    }
}

impl fmt::Debug for SecurityKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityKeys")
            .field("algorithm", &self.algorithm())
            .field("key_pair", &self.key_pair)
            .finish()
    }
}

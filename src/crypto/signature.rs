//! Asymmetric signing for request/response authenticity
//!
//! Callers only see [`SignatureScheme`]. The shipped scheme is Ed25519, a classical
//! stand-in advertised on the wire as `quantum-hybrid` until a post-quantum primitive
//! replaces it behind the same trait.

use super::errors::{CryptoError, Result};
use ring::rand::SystemRandom;
use ring::signature::{self, Ed25519KeyPair, KeyPair as _};
use std::fmt;
use std::sync::Arc;

/// Algorithm label carried in signed EDNS options
pub const WIRE_ALGORITHM: &str = "quantum-hybrid";

/// Public/private key material for a signature scheme
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public_key: Vec<u8>,
    /// Scheme-specific private key encoding (PKCS#8 for Ed25519)
    pub private_key: Vec<u8>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(&self.public_key))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Swappable signing primitive
pub trait SignatureScheme: Send + Sync {
    /// Name advertised in signed options
    fn algorithm(&self) -> &'static str;

    /// Generate a fresh key pair from a secure random source
    fn generate_key_pair(&self) -> Result<KeyPair>;

    /// Sign `data` with an encoded private key
    fn sign(&self, data: &[u8], private_key: &[u8]) -> Result<Vec<u8>>;

    /// Verify `signature` over `data`
    fn verify(&self, data: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// Ed25519 via ring
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Scheme;

impl SignatureScheme for Ed25519Scheme {
    fn algorithm(&self) -> &'static str {
        WIRE_ALGORITHM
    }

    fn generate_key_pair(&self) -> Result<KeyPair> {
        let rng = SystemRandom::new();
        let pkcs8 =
            Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| CryptoError::KeyGenerationFailed)?;
        let pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        Ok(KeyPair {
            public_key: pair.public_key().as_ref().to_vec(),
            private_key: pkcs8.as_ref().to_vec(),
        })
    }

    fn sign(&self, data: &[u8], private_key: &[u8]) -> Result<Vec<u8>> {
        let pair = Ed25519KeyPair::from_pkcs8(private_key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(pair.sign(data).as_ref().to_vec())
    }

    fn verify(&self, data: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        signature::UnparsedPublicKey::new(&signature::ED25519, public_key)
            .verify(data, signature)
            .is_ok()
    }
}

/// Default scheme used when none is injected
pub fn default_scheme() -> Arc<dyn SignatureScheme> {
    Arc::new(Ed25519Scheme)
}

pub mod aead;
pub mod digest;
pub mod errors;
pub mod random;
pub mod signature;

pub use aead::{SealedData, decrypt_aead, encrypt_aead};
pub use digest::{HashAlgorithm, hash, hmac, sha256_hex, verify_hmac};
pub use errors::CryptoError;
pub use random::random_bytes;
pub use signature::{Ed25519Scheme, KeyPair, SignatureScheme, WIRE_ALGORITHM, default_scheme};

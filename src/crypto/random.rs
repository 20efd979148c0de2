use super::errors::{CryptoError, Result};
use ring::rand::{SecureRandom, SystemRandom};

/// Fill a fresh buffer of `len` bytes from the system CSPRNG
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| CryptoError::RandomUnavailable)?;
    Ok(buf)
}

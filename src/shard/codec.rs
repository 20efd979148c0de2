//! Threshold chunking with XOR parity and an encrypted snapshot
//!
//! `split` cuts a payload into `threshold` contiguous data shards plus
//! `total - threshold` parity shards. Direct reconstruction needs every data shard
//! (positions `0..threshold`); parity shards are not interchangeable with data shards.
//! The shard at position 0 carries an AEAD snapshot of the whole payload and the
//! shard at position 1 carries its key, so those two alone always recover it.
//!
//! Parity shards are stored with their source positions, but reconstruction does not
//! invert them: a set that is short on data shards and lacks the snapshot pair fails
//! even when the parity count would cover the gap.

use super::errors::{Result, ShardError};
use super::types::{DataShard, ParityShard, Shard, Verification};
use crate::crypto::{self, HashAlgorithm, aead};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Number of data shards folded into each parity shard
pub const PARITY_SOURCES: usize = 3;

/// Minimum threshold: positions 0 and 1 must both be data shards
pub const MIN_THRESHOLD: usize = 2;

/// Splits payloads into shard sets and reassembles them
#[derive(Clone, Default)]
pub struct ShardCodec {
    /// HMAC key for shard signatures
    signing_key: Option<Vec<u8>>,
}

impl std::fmt::Debug for ShardCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardCodec")
            .field("signed", &self.signing_key.is_some())
            .finish()
    }
}

impl ShardCodec {
    pub fn new(signing_key: Option<Vec<u8>>) -> Self {
        Self { signing_key }
    }

    /// Split `data` into `threshold` data shards and `total - threshold` parity shards
    pub fn split(&self, data: &[u8], total: usize, threshold: usize) -> Result<Vec<Shard>> {
        if threshold < MIN_THRESHOLD {
            return Err(ShardError::InvalidParameters(format!(
                "threshold must be at least {}, got {}",
                MIN_THRESHOLD, threshold
            )));
        }
        if total < threshold {
            return Err(ShardError::InvalidParameters(format!(
                "total shards ({}) must be >= threshold ({})",
                total, threshold
            )));
        }

        let snapshot_key = crypto::random_bytes(aead::KEY_LEN)?;
        let snapshot = crypto::encrypt_aead(data, &snapshot_key, None)?;

        let verification = Verification {
            hash: crypto::sha256_hex(data),
            total_size: data.len(),
            encrypted_data: None,
            encryption_key: None,
        };

        let chunk_size = data.len().div_ceil(threshold);
        let mut chunks = Vec::with_capacity(threshold);
        for position in 0..threshold {
            let start = (position * chunk_size).min(data.len());
            let end = (start + chunk_size).min(data.len());
            chunks.push(&data[start..end]);
        }

        let mut shards = Vec::with_capacity(total);
        for (position, chunk) in chunks.iter().enumerate() {
            shards.push(Shard::Data(DataShard {
                id: Uuid::new_v4().to_string(),
                position,
                data: chunk.to_vec(),
                size: chunk.len(),
                total: threshold,
                verification: verification.clone(),
                signature: None,
            }));
        }

        let mut rng = rand::rng();
        let sources_per_parity = PARITY_SOURCES.min(threshold);
        for slot in 0..(total - threshold) {
            let mut sources =
                rand::seq::index::sample(&mut rng, threshold, sources_per_parity).into_vec();
            sources.sort_unstable();

            let combined = xor_chunks(sources.iter().map(|&p| chunks[p]));
            shards.push(Shard::Parity(ParityShard {
                id: Uuid::new_v4().to_string(),
                position: threshold + slot,
                size: combined.len(),
                data: combined,
                total,
                source_positions: sources,
                verification: verification.clone(),
                signature: None,
            }));
        }

        shards[0].verification_mut().encrypted_data = Some(snapshot);
        shards[1].verification_mut().encryption_key = Some(hex::encode(&snapshot_key));

        if let Some(key) = &self.signing_key {
            for shard in shards.iter_mut() {
                let signature =
                    crypto::hmac(shard.signing_payload().as_bytes(), key, HashAlgorithm::Sha256);
                shard.set_signature(signature);
            }
        }

        debug!(
            "Split {} bytes into {} shards (threshold {})",
            data.len(),
            total,
            threshold
        );
        Ok(shards)
    }

    /// Reassemble the original payload from whatever shards survived
    pub fn reconstruct(&self, shards: &[Shard]) -> Result<Vec<u8>> {
        let mut available: Vec<&Shard> = shards
            .iter()
            .filter(|shard| {
                let accepted = self.verify_signature(shard);
                if !accepted {
                    warn!("Discarding shard {} with invalid signature", shard.id());
                }
                accepted
            })
            .collect();
        available.sort_by_key(|shard| shard.position());

        let Some(first) = available.first() else {
            return Err(ShardError::InsufficientShards {
                have: 0,
                need: MIN_THRESHOLD,
            });
        };
        let expected_hash = first.verification().hash.clone();
        let total_size = first.verification().total_size;

        let mut data: Vec<&DataShard> = Vec::new();
        let mut parity: Vec<&ParityShard> = Vec::new();
        for shard in &available {
            match shard {
                Shard::Data(d) => {
                    if data.last().is_none_or(|prev| prev.position != d.position) {
                        data.push(d);
                    }
                }
                Shard::Parity(p) => parity.push(p),
            }
        }

        let threshold = data.first().map(|d| d.total);
        let mut hash_mismatch = false;

        if let Some(threshold) = threshold {
            let contiguous = data.len() >= threshold
                && data[..threshold]
                    .iter()
                    .enumerate()
                    .all(|(i, d)| d.position == i);

            if contiguous {
                let mut bytes: Vec<u8> = data[..threshold]
                    .iter()
                    .flat_map(|d| d.data.iter().copied())
                    .collect();
                bytes.resize(total_size, 0);

                if crypto::sha256_hex(&bytes) == expected_hash {
                    trace!("Reconstructed {} bytes from data shards", bytes.len());
                    return Ok(bytes);
                }
                warn!("Reconstructed data failed hash verification, trying snapshot");
                hash_mismatch = true;
            }
        }

        if let Some(bytes) = self.recover_from_snapshot(&available, &expected_hash) {
            return Ok(bytes);
        }

        let need = threshold.unwrap_or(MIN_THRESHOLD);
        if !hash_mismatch {
            let set_size = parity
                .first()
                .map(|p| p.total)
                .unwrap_or(need + parity.len());
            if data.len() < need && data.len() + parity.len() >= set_size {
                // Parity shards are not inverted; this set cannot be rebuilt.
                warn!(
                    "Parity recovery unsupported: {} data + {} parity shards available",
                    data.len(),
                    parity.len()
                );
            }
        }

        if hash_mismatch {
            Err(ShardError::IntegrityFailure {
                expected: expected_hash,
            })
        } else {
            Err(ShardError::InsufficientShards {
                have: data.len(),
                need,
            })
        }
    }

    /// True when the shard carries a valid HMAC, or when no signing key is configured
    pub fn verify_signature(&self, shard: &Shard) -> bool {
        let Some(key) = &self.signing_key else {
            return true;
        };
        match shard.signature() {
            Some(signature) => crypto::verify_hmac(
                shard.signing_payload().as_bytes(),
                key,
                signature,
                HashAlgorithm::Sha256,
            ),
            None => false,
        }
    }

    fn recover_from_snapshot(&self, shards: &[&Shard], expected_hash: &str) -> Option<Vec<u8>> {
        let sealed = shards
            .iter()
            .find_map(|s| s.verification().encrypted_data.as_ref())?;
        let key_hex = shards
            .iter()
            .find_map(|s| s.verification().encryption_key.as_ref())?;

        let key = match hex::decode(key_hex) {
            Ok(key) => key,
            Err(e) => {
                warn!("Snapshot key is not valid hex: {}", e);
                return None;
            }
        };

        match crypto::decrypt_aead(sealed, &key) {
            Ok(bytes) if crypto::sha256_hex(&bytes) == expected_hash => {
                debug!("Recovered {} bytes from encrypted snapshot", bytes.len());
                Some(bytes)
            }
            Ok(_) => {
                warn!("Snapshot decrypted but does not match the recorded hash");
                None
            }
            Err(e) => {
                warn!("Snapshot recovery failed: {}", e);
                None
            }
        }
    }
}

/// XOR chunks together, zero-padding shorter ones to the longest
fn xor_chunks<'a>(chunks: impl Iterator<Item = &'a [u8]>) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for chunk in chunks {
        if chunk.len() > out.len() {
            out.resize(chunk.len(), 0);
        }
        for (o, b) in out.iter_mut().zip(chunk) {
            *o ^= b;
        }
    }
    out
}

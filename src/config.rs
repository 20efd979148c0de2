use crate::error::ConfigError;
use crate::security::{DEFAULT_MAX_QUESTIONS, DEFAULT_REPLAY_WINDOW};
use crate::shard::codec::MIN_THRESHOLD;
use crate::shard::constants::{DEFAULT_SHARD_COUNT, DEFAULT_THRESHOLD};
use crate::zone::constants::DEFAULT_TTL;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on shards per record
const MAX_SHARD_COUNT: usize = 64;

#[derive(Clone)]
pub struct Config {
    /// Directory holding one `<zone>.json` document per zone
    pub zone_dir: PathBuf,

    /// Whether records are persisted as shard sets
    pub sharding_enabled: bool,

    /// Total shards per record (data + parity)
    pub shard_count: usize,

    /// Data shards per record
    pub shard_threshold: usize,

    /// HMAC key for shard signatures (None = unsigned shards)
    pub shard_signing_key: Option<Vec<u8>>,

    /// TTL for records that don't carry one
    pub default_ttl: u32,

    /// Key file for signing DNS responses (None = unsigned)
    pub wire_key_file: Option<PathBuf>,

    /// Maximum age of a signed option
    pub replay_window: Duration,

    /// Maximum questions per request
    pub max_questions: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("zone_dir", &self.zone_dir)
            .field("sharding_enabled", &self.sharding_enabled)
            .field("shard_count", &self.shard_count)
            .field("shard_threshold", &self.shard_threshold)
            .field(
                "shard_signing_key",
                &self.shard_signing_key.as_ref().map(|_| "<redacted>"),
            )
            .field("default_ttl", &self.default_ttl)
            .field("wire_key_file", &self.wire_key_file)
            .field("replay_window", &self.replay_window)
            .field("max_questions", &self.max_questions)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zone_dir: PathBuf::from("zones"),
            sharding_enabled: true,
            shard_count: DEFAULT_SHARD_COUNT,
            shard_threshold: DEFAULT_THRESHOLD,
            shard_signing_key: None,
            default_ttl: DEFAULT_TTL,
            wire_key_file: None,
            replay_window: DEFAULT_REPLAY_WINDOW,
            max_questions: DEFAULT_MAX_QUESTIONS,
        }
    }
}

impl Config {
    /// Create a Config from environment variables
    /// Returns Err if critical configuration is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(zone_dir) = lookup("FRACTAL_ZONE_DIR") {
            if zone_dir.trim().is_empty() {
                return Err(ConfigError::InvalidZoneDir(
                    "Zone directory must not be empty".to_string(),
                ));
            }
            config.zone_dir = PathBuf::from(zone_dir.trim());
        }

        if let Some(sharding) = lookup("FRACTAL_SHARDING_ENABLED") {
            config.sharding_enabled = parse_bool(&sharding, true);
        }

        if let Some(shard_count) = lookup("FRACTAL_SHARD_COUNT") {
            config.shard_count = shard_count.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidShardParameters(format!("Invalid shard count: {}", shard_count))
            })?;
        }

        if let Some(threshold) = lookup("FRACTAL_SHARD_THRESHOLD") {
            config.shard_threshold = threshold.trim().parse::<usize>().map_err(|_| {
                ConfigError::InvalidShardParameters(format!("Invalid threshold: {}", threshold))
            })?;
        }

        if let Some(key) = lookup("FRACTAL_SHARD_SIGNING_KEY") {
            if !key.is_empty() {
                let bytes = hex::decode(key.trim())
                    .map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))?;
                config.shard_signing_key = Some(bytes);
            }
        }

        if let Some(default_ttl) = lookup("FRACTAL_DEFAULT_TTL") {
            config.default_ttl = default_ttl.trim().parse::<u32>().map_err(|_| {
                ConfigError::ParseError(format!("Invalid default TTL: {}", default_ttl))
            })?;
        }

        if let Some(key_file) = lookup("FRACTAL_WIRE_KEY_FILE") {
            if !key_file.is_empty() {
                config.wire_key_file = Some(PathBuf::from(key_file));
            }
        }

        if let Some(window) = lookup("FRACTAL_REPLAY_WINDOW") {
            let secs = window
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidReplayWindow(window.clone()))?;
            config.replay_window = Duration::from_secs(secs);
        }

        if let Some(max_questions) = lookup("FRACTAL_MAX_QUESTIONS") {
            config.max_questions = max_questions.trim().parse::<usize>().map_err(|_| {
                ConfigError::ParseError(format!("Invalid max questions: {}", max_questions))
            })?;
        }

        // Validate the final configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_threshold < MIN_THRESHOLD {
            return Err(ConfigError::InvalidShardParameters(format!(
                "Threshold must be at least {}",
                MIN_THRESHOLD
            )));
        }

        if self.shard_count < self.shard_threshold {
            return Err(ConfigError::InvalidShardParameters(format!(
                "Shard count {} is below threshold {}",
                self.shard_count, self.shard_threshold
            )));
        }

        if self.shard_count > MAX_SHARD_COUNT {
            return Err(ConfigError::InvalidShardParameters(format!(
                "Shard count too large (max {})",
                MAX_SHARD_COUNT
            )));
        }

        if matches!(&self.shard_signing_key, Some(key) if key.is_empty()) {
            return Err(ConfigError::InvalidSigningKey("Key is empty".to_string()));
        }

        if self.replay_window.is_zero() || self.replay_window.as_secs() > 3600 {
            return Err(ConfigError::InvalidReplayWindow(
                "Replay window must be between 1 and 3600 seconds".to_string(),
            ));
        }

        if self.max_questions == 0 {
            return Err(ConfigError::ParseError(
                "Max questions must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a boolean from a string, with a default value for invalid input
fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

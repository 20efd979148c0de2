pub mod codec;
pub mod errors;
pub mod types;

pub use codec::ShardCodec;
pub use errors::{Result, ShardError};
pub use types::{DataShard, ParityShard, Shard, Verification};

/// Shard defaults
pub mod constants {
    /// Shards produced per record
    pub const DEFAULT_SHARD_COUNT: usize = 8;

    /// Data shards needed for direct reconstruction
    pub const DEFAULT_THRESHOLD: usize = 4;
}

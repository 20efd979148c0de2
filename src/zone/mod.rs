//! Zone storage
//!
//! Zones are JSON documents persisted through a [`ZoneBackend`]. In sharded mode
//! each record is stored as a shard set and reconstructed on read.

pub mod authoritative;
pub mod backend;
pub mod errors;
pub mod export;
pub mod record;
pub mod store;
#[allow(clippy::module_inception)]
pub mod zone;

pub use authoritative::AuthoritativeResponder;
pub use backend::{FileBackend, MemoryBackend, ZoneBackend};
pub use errors::{Result, ZoneError};
pub use export::{render_zone, zone_serial};
pub use record::{NewRecord, Record};
pub use store::{StoreOptions, ZoneStore, ZoneSummary};
pub use zone::{ShardIndexEntry, Zone, ZoneMeta};

/// Zone constants
pub mod constants {
    /// Default TTL if not specified (1 hour)
    pub const DEFAULT_TTL: u32 = 3600;

    /// Maximum zone file size (10MB)
    pub const MAX_ZONE_FILE_SIZE: usize = 10 * 1024 * 1024;

    /// SOA timers used in text export
    pub const SOA_REFRESH: u32 = 3600;
    pub const SOA_RETRY: u32 = 900;
    pub const SOA_EXPIRE: u32 = 604800;
    pub const SOA_MINIMUM: u32 = 86400;
}

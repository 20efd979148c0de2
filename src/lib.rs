pub mod config;
pub mod crypto;
pub mod dns;
pub mod error;
pub mod security;
pub mod shard;
pub mod zone;

pub use config::Config;
pub use dns::DNSPacket;
pub use security::WireSecurity;
pub use zone::ZoneStore;

//! Shared helpers for integration tests

#![allow(dead_code)] // Not every test file uses every helper

use fractal_dns::dns::{
    DNSPacket,
    enums::{DNSResourceClass, DNSResourceType},
    header::DNSHeader,
    question::DNSQuestion,
};
use fractal_dns::shard::ShardCodec;
use fractal_dns::zone::{FileBackend, MemoryBackend, StoreOptions, ZoneStore};
use std::path::Path;
use std::sync::Arc;

pub const SIGNING_KEY: &[u8] = b"integration-shard-key";

/// Sharded store over an in-memory backend
pub fn memory_store() -> ZoneStore {
    ZoneStore::new(
        Arc::new(MemoryBackend::new()),
        ShardCodec::default(),
        StoreOptions::default(),
    )
}

/// Store with unsigned plain records
pub fn plain_store() -> ZoneStore {
    ZoneStore::new(
        Arc::new(MemoryBackend::new()),
        ShardCodec::default(),
        StoreOptions {
            sharding_enabled: false,
            ..Default::default()
        },
    )
}

/// File-backed store with signed shards
pub fn file_store(dir: &Path) -> ZoneStore {
    ZoneStore::new(
        Arc::new(FileBackend::new(dir)),
        ShardCodec::new(Some(SIGNING_KEY.to_vec())),
        StoreOptions::default(),
    )
}

/// Create a test DNS query packet with specific ID
pub fn create_test_query_with_id(id: u16, domain: &str, qtype: DNSResourceType) -> DNSPacket {
    let labels: Vec<String> = domain.split('.').map(|s| s.to_string()).collect();

    DNSPacket {
        header: DNSHeader {
            id,
            rd: true,
            qdcount: 1,
            ..Default::default()
        },
        questions: vec![DNSQuestion {
            labels,
            qtype,
            qclass: DNSResourceClass::IN,
        }],
        answers: vec![],
        authorities: vec![],
        resources: vec![],
        edns: None,
    }
}

/// Payload large enough to give every data shard distinct content
pub fn sample_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

use super::record::{NewRecord, Record, slot_matches_query};
use crate::shard::Shard;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted zone document
///
/// Exactly one representation is authoritative: `records` when `meta.sharded` is
/// false, `sharded_records` + `shards` when it is true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharded_records: Option<Vec<ShardIndexEntry>>,
    /// Keyed by [`shard_key`]
    #[serde(default)]
    pub shards: BTreeMap<String, Shard>,
    pub meta: ZoneMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMeta {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub sharded: bool,
    pub shard_count: usize,
    #[serde(default)]
    pub record_count: usize,
}

/// Index of the shard set that holds one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardIndexEntry {
    /// SHA-256 hex of domain + type + value
    pub id: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub rtype: String,
    /// Shard ids in position order
    pub shards: Vec<String>,
    pub threshold: usize,
    pub created: DateTime<Utc>,
}

impl ShardIndexEntry {
    pub fn matches_query(&self, domain: &str, rtype: &str) -> bool {
        slot_matches_query(&self.domain, &self.rtype, domain, rtype)
    }
}

/// Compound key of a shard inside [`Zone::shards`]
pub fn shard_key(record_id: &str, shard_id: &str) -> String {
    format!("{}:{}", record_id, shard_id)
}

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

impl Zone {
    /// Create a new empty zone
    pub fn new(now: DateTime<Utc>, shard_count: usize) -> Self {
        Self {
            records: Vec::new(),
            sharded_records: None,
            shards: BTreeMap::new(),
            meta: ZoneMeta {
                created: now,
                updated: now,
                sharded: false,
                shard_count,
                record_count: 0,
            },
        }
    }

    /// Insert or update the record in the (domain, type) slot.
    /// Operates on `records`, so sharded zones must be materialized first.
    pub fn upsert(&mut self, new: NewRecord, now: DateTime<Utc>) -> (Upsert, Record) {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.is_same_slot(&new.domain, &new.rtype))
        {
            existing.value = new.value;
            existing.priority = new.priority;
            existing.ttl = new.ttl;
            existing.updated = now;
            return (Upsert::Updated, existing.clone());
        }

        let record = new.into_record(now);
        self.records.push(record.clone());
        (Upsert::Inserted, record)
    }

    /// Remove the record in the (domain, type) slot
    pub fn remove(&mut self, domain: &str, rtype: &str) -> Option<Record> {
        let index = self
            .records
            .iter()
            .position(|r| r.is_same_slot(domain, rtype))?;
        Some(self.records.remove(index))
    }

    /// Drop the sharded representation
    pub fn clear_shards(&mut self) {
        self.sharded_records = None;
        self.shards.clear();
        self.meta.sharded = false;
    }

    /// Shards belonging to one index entry, in index order; missing shards are skipped
    pub fn shards_for(&self, entry: &ShardIndexEntry) -> Vec<Shard> {
        entry
            .shards
            .iter()
            .filter_map(|shard_id| self.shards.get(&shard_key(&entry.id, shard_id)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_preserves_created() {
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(5);
        let mut zone = Zone::new(t0, 8);

        let (outcome, first) = zone.upsert(NewRecord::new("www", "A", "1.2.3.4"), t0);
        assert_eq!(outcome, Upsert::Inserted);

        let (outcome, second) = zone.upsert(NewRecord::new("WWW", "a", "5.6.7.8"), t1);
        assert_eq!(outcome, Upsert::Updated);
        assert_eq!(zone.records.len(), 1);
        assert_eq!(second.created, first.created);
        assert_eq!(second.updated, t1);
        assert_eq!(zone.records[0].value, "5.6.7.8");
    }

    #[test]
    fn test_remove() {
        let now = Utc::now();
        let mut zone = Zone::new(now, 8);
        zone.upsert(NewRecord::new("www", "A", "1.2.3.4"), now);
        zone.upsert(NewRecord::new("www", "AAAA", "::1"), now);

        assert!(zone.remove("www", "MX").is_none());
        assert_eq!(zone.remove("www", "A").unwrap().value, "1.2.3.4");
        assert_eq!(zone.records.len(), 1);
    }

    #[test]
    fn test_document_field_names() {
        let zone = Zone::new(Utc::now(), 8);
        let json = serde_json::to_value(&zone).unwrap();
        assert!(json.get("records").is_some());
        assert!(json.get("shardedRecords").is_none());
        assert_eq!(json["meta"]["shardCount"], 8);
        assert_eq!(json["meta"]["recordCount"], 0);
        assert_eq!(json["meta"]["sharded"], false);
    }
}

use super::backend::{FileBackend, ZoneBackend};
use super::export::render_zone;
use super::record::{self, APEX, NewRecord, Record};
use super::zone::{ShardIndexEntry, Upsert, shard_key};
use super::{Result, Zone, ZoneError};
use crate::config::Config;
use crate::crypto;
use crate::shard::ShardCodec;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Storage behaviour of a [`ZoneStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Persist records as shard sets instead of a plain record list
    pub sharding_enabled: bool,
    pub shard_count: usize,
    pub shard_threshold: usize,
    /// TTL used for records without one
    pub default_ttl: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            sharding_enabled: true,
            shard_count: crate::shard::constants::DEFAULT_SHARD_COUNT,
            shard_threshold: crate::shard::constants::DEFAULT_THRESHOLD,
            default_ttl: super::constants::DEFAULT_TTL,
        }
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        Self {
            sharding_enabled: config.sharding_enabled,
            shard_count: config.shard_count,
            shard_threshold: config.shard_threshold,
            default_ttl: config.default_ttl,
        }
    }
}

/// In-memory index entry for a zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneSummary {
    pub record_count: usize,
    pub last_updated: DateTime<Utc>,
    pub sharded: bool,
}

/// Store for managing multiple DNS zones
///
/// Mutations of one zone are serialized by a per-name async mutex; each one is a
/// read-modify-write of the full document. Reads take no lock.
pub struct ZoneStore {
    backend: Arc<dyn ZoneBackend>,
    codec: ShardCodec,
    options: StoreOptions,
    /// Zone name → summary
    index: DashMap<String, ZoneSummary>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ZoneStore {
    pub fn new(backend: Arc<dyn ZoneBackend>, codec: ShardCodec, options: StoreOptions) -> Self {
        Self {
            backend,
            codec,
            options,
            index: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    /// File-backed store configured from `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(FileBackend::new(&config.zone_dir)),
            ShardCodec::new(config.shard_signing_key.clone()),
            StoreOptions::from(config),
        )
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Scan the backend and rebuild the index. Zones that fail to load are skipped.
    pub async fn load_all(&self) -> Result<usize> {
        let names = self.backend.list().await?;
        self.index.clear();

        for name in names {
            if validate_zone_name(&name).is_err() {
                warn!("Skipping zone with invalid name: {}", name);
                continue;
            }
            match self.backend.load(&name).await {
                Ok(Some(zone)) => {
                    self.index.insert(name.clone(), summarize(&zone));
                    debug!("Indexed zone {} ({} records)", name, zone.meta.record_count);
                }
                Ok(None) => debug!("Zone {} disappeared during scan", name),
                Err(e) => warn!("Failed to load zone {}: {}", name, e),
            }
        }

        info!("Loaded {} zones", self.index.len());
        Ok(self.index.len())
    }

    /// Index snapshot, sorted by zone name
    pub fn list_zones(&self) -> Vec<(String, ZoneSummary)> {
        let mut zones: Vec<(String, ZoneSummary)> = self
            .index
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        zones.sort_by(|a, b| a.0.cmp(&b.0));
        zones
    }

    pub fn summary(&self, name: &str) -> Option<ZoneSummary> {
        let name = name.to_lowercase();
        self.index.get(&name).map(|entry| entry.value().clone())
    }

    pub async fn create_zone(&self, name: &str) -> Result<Zone> {
        let name = validate_zone_name(name)?;
        let _guard = self.lock_zone(&name).await;

        if self.backend.exists(&name).await? {
            return Err(ZoneError::ZoneExists(name));
        }

        let mut zone = Zone::new(Utc::now(), self.options.shard_count);
        self.persist(&name, &mut zone).await?;
        info!("Created zone {}", name);
        Ok(zone)
    }

    /// Zone document in plain form: `records` materialized, shard set dropped.
    /// Edits to `records` can be handed back to [`ZoneStore::save_zone`].
    pub async fn get_zone(&self, name: &str) -> Result<Zone> {
        let mut zone = self.load_document(name).await?;
        zone.records = self.materialize(&zone)?;
        zone.clear_shards();
        Ok(zone)
    }

    /// Persisted zone document, as stored
    pub async fn load_document(&self, name: &str) -> Result<Zone> {
        let name = validate_zone_name(name)?;
        self.backend
            .load(&name)
            .await?
            .ok_or(ZoneError::ZoneNotFound(name))
    }

    /// Logical records of a zone, reconstructed from shards when needed
    pub async fn records(&self, name: &str) -> Result<Vec<Record>> {
        Ok(self.get_zone(name).await?.records)
    }

    /// Persist `zone` under `name`, re-deriving shards when sharding is enabled.
    /// Accepts either representation of the document.
    pub async fn save_zone(&self, name: &str, mut zone: Zone) -> Result<Zone> {
        let name = validate_zone_name(name)?;
        let _guard = self.lock_zone(&name).await;

        zone.records = self.materialize(&zone)?;
        self.persist(&name, &mut zone).await?;
        Ok(zone)
    }

    pub async fn delete_zone(&self, name: &str) -> Result<()> {
        let name = validate_zone_name(name)?;
        let _guard = self.lock_zone(&name).await;

        let removed = self.backend.remove(&name).await?;
        self.release_lock(&name);
        if !removed {
            return Err(ZoneError::ZoneNotFound(name));
        }
        self.index.remove(&name);
        info!("Deleted zone {}", name);
        Ok(())
    }

    /// Insert or update the record in its (domain, type) slot
    pub async fn add_record(&self, zone_name: &str, new: NewRecord) -> Result<Record> {
        let name = validate_zone_name(zone_name)?;
        let new = new.normalized()?;
        let _guard = self.lock_zone(&name).await;

        let mut zone = self.load_materialized(&name).await?;
        let (outcome, record) = zone.upsert(new, Utc::now());
        self.persist(&name, &mut zone).await?;

        match outcome {
            Upsert::Inserted => debug!("Added {} {} to {}", record.domain, record.rtype, name),
            Upsert::Updated => debug!("Updated {} {} in {}", record.domain, record.rtype, name),
        }
        Ok(record)
    }

    pub async fn delete_record(&self, zone_name: &str, domain: &str, rtype: &str) -> Result<Record> {
        let name = validate_zone_name(zone_name)?;
        let domain = record::normalize_domain(domain);
        let rtype = record::normalize_type(rtype);
        let _guard = self.lock_zone(&name).await;

        let mut zone = self.load_materialized(&name).await?;
        let removed = zone
            .remove(&domain, &rtype)
            .ok_or_else(|| ZoneError::RecordNotFound {
                zone: name.clone(),
                domain: domain.clone(),
                rtype: rtype.clone(),
            })?;
        self.persist(&name, &mut zone).await?;

        debug!("Deleted {} {} from {}", domain, rtype, name);
        Ok(removed)
    }

    /// Records answering `query` (a name whose final label is the zone).
    /// Unknown zones yield an empty result.
    pub async fn lookup(&self, query: &str, rtype: &str) -> Result<Vec<Record>> {
        let query = query.trim().trim_end_matches('.').to_lowercase();
        let (domain, zone_name) = match query.rsplit_once('.') {
            Some((domain, zone_name)) => (domain.to_string(), zone_name.to_string()),
            None => (APEX.to_string(), query.clone()),
        };

        if validate_zone_name(&zone_name).is_err() {
            return Ok(Vec::new());
        }
        let Some(zone) = self.backend.load(&zone_name).await? else {
            debug!("Lookup for {} outside served zones", query);
            return Ok(Vec::new());
        };

        if !zone.meta.sharded {
            return Ok(zone
                .records
                .into_iter()
                .filter(|r| r.matches_query(&domain, rtype))
                .collect());
        }

        // Only the matching shard sets are reconstructed
        zone.sharded_records
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|entry| entry.matches_query(&domain, rtype))
            .map(|entry| self.reconstruct_entry(&zone, entry))
            .collect()
    }

    /// BIND-style text rendering of a zone
    pub async fn export_text(&self, name: &str) -> Result<String> {
        let zone = self.get_zone(name).await?;
        Ok(render_zone(
            &validate_zone_name(name)?,
            &zone.meta,
            &zone.records,
            self.options.default_ttl,
        ))
    }

    async fn lock_zone(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(name.to_string()).or_default().value().clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry of a zone that no longer exists. The caller holds the
    /// guard, so a count of two means nobody else is waiting on it.
    fn release_lock(&self, name: &str) {
        self.locks.remove_if(name, |_, lock| Arc::strong_count(lock) == 2);
    }

    /// Caller holds the zone lock
    async fn load_materialized(&self, name: &str) -> Result<Zone> {
        let Some(mut zone) = self.backend.load(name).await? else {
            self.release_lock(name);
            return Err(ZoneError::ZoneNotFound(name.to_string()));
        };
        zone.records = self.materialize(&zone)?;
        zone.clear_shards();
        Ok(zone)
    }

    /// Logical record list of a document
    fn materialize(&self, zone: &Zone) -> Result<Vec<Record>> {
        if !zone.meta.sharded {
            return Ok(zone.records.clone());
        }

        zone.sharded_records
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|entry| self.reconstruct_entry(zone, entry))
            .collect()
    }

    fn reconstruct_entry(&self, zone: &Zone, entry: &ShardIndexEntry) -> Result<Record> {
        let shards = zone.shards_for(entry);
        let bytes = self.codec.reconstruct(&shards).inspect_err(|e| {
            warn!(
                "Failed to reconstruct {} {} ({}): {}",
                entry.domain, entry.rtype, entry.id, e
            )
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write the document; caller holds the zone lock and `zone.records` is authoritative
    async fn persist(&self, name: &str, zone: &mut Zone) -> Result<()> {
        let now = Utc::now();
        zone.meta.updated = now;
        zone.meta.record_count = zone.records.len();
        zone.meta.shard_count = self.options.shard_count;
        zone.clear_shards();

        if self.options.sharding_enabled && !zone.records.is_empty() {
            self.shard_records(zone, now)?;
        }

        self.backend.store(name, zone).await?;
        self.index.insert(name.to_string(), summarize(zone));
        Ok(())
    }

    /// Replace `records` with a freshly derived shard set
    fn shard_records(&self, zone: &mut Zone, now: DateTime<Utc>) -> Result<()> {
        let records = std::mem::take(&mut zone.records);
        let mut entries = Vec::with_capacity(records.len());
        let mut shards = BTreeMap::new();

        for record in &records {
            let bytes = serde_json::to_vec(record)?;
            let set = self.codec.split(
                &bytes,
                self.options.shard_count,
                self.options.shard_threshold,
            )?;

            let id = record_id(record);
            let shard_ids: Vec<String> = set.iter().map(|s| s.id().to_string()).collect();
            for shard in set {
                shards.insert(shard_key(&id, shard.id()), shard);
            }

            entries.push(ShardIndexEntry {
                id,
                domain: record.domain.clone(),
                rtype: record.rtype.clone(),
                shards: shard_ids,
                threshold: self.options.shard_threshold,
                created: now,
            });
        }

        zone.sharded_records = Some(entries);
        zone.shards = shards;
        zone.meta.sharded = true;
        Ok(())
    }
}

/// Content hash identifying a record's shard set
pub fn record_id(record: &Record) -> String {
    crypto::sha256_hex(format!("{}{}{}", record.domain, record.rtype, record.value).as_bytes())
}

/// Zone names are single DNS labels: letters, digits and hyphens
pub fn validate_zone_name(name: &str) -> Result<String> {
    let name = name.trim().trim_end_matches('.').to_lowercase();
    let valid = !name.is_empty()
        && name.len() <= 63
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(name)
    } else {
        Err(ZoneError::InvalidName(name))
    }
}

fn summarize(zone: &Zone) -> ZoneSummary {
    ZoneSummary {
        record_count: zone.meta.record_count,
        last_updated: zone.meta.updated,
        sharded: zone.meta.sharded,
    }
}

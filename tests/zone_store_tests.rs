mod common;

use chrono::Utc;
use common::{file_store, memory_store, plain_store};
use fractal_dns::shard::ShardCodec;
use fractal_dns::zone::zone::shard_key;
use fractal_dns::zone::{
    MemoryBackend, NewRecord, StoreOptions, Zone, ZoneBackend, ZoneError, ZoneStore,
};
use std::sync::Arc;

#[tokio::test]
async fn test_new_zone_is_empty() {
    let store = memory_store();
    let zone = store.create_zone("example").await.unwrap();
    assert_eq!(zone.meta.record_count, 0);

    let summary = store.summary("example").unwrap();
    assert_eq!(summary.record_count, 0);
    assert!(!summary.sharded);
}

#[tokio::test]
async fn test_sharded_add_and_lookup() {
    let store = memory_store();
    store.create_zone("example").await.unwrap();
    store
        .add_record(
            "example",
            NewRecord::new("www", "A", "1.2.3.4").with_ttl(3600),
        )
        .await
        .unwrap();

    let found = store.lookup("www.example", "A").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value, "1.2.3.4");
    assert_eq!(found[0].ttl, Some(3600));

    assert!(store.lookup("www.example", "AAAA").await.unwrap().is_empty());
    assert!(store.lookup("mail.example", "A").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let store = memory_store();
    store.create_zone("example").await.unwrap();

    let first = store
        .add_record("example", NewRecord::new("www", "A", "1.2.3.4"))
        .await
        .unwrap();
    let second = store
        .add_record("example", NewRecord::new("WWW", "a", "5.6.7.8"))
        .await
        .unwrap();

    assert_eq!(second.created, first.created);
    assert!(second.updated >= first.updated);

    let zone = store.get_zone("example").await.unwrap();
    assert_eq!(zone.meta.record_count, 1);
    assert_eq!(zone.records.len(), 1);
    assert_eq!(zone.records[0].value, "5.6.7.8");

    let stored = store.load_document("example").await.unwrap();
    assert_eq!(stored.sharded_records.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_edit_save_keeps_edits() {
    let store = memory_store();
    store.create_zone("example").await.unwrap();
    store
        .add_record("example", NewRecord::new("www", "A", "1.2.3.4"))
        .await
        .unwrap();

    let mut zone = store.get_zone("example").await.unwrap();
    assert!(zone.shards.is_empty());
    zone.upsert(NewRecord::new("mail", "A", "5.6.7.8"), Utc::now());
    store.save_zone("example", zone).await.unwrap();

    assert_eq!(store.records("example").await.unwrap().len(), 2);
    let found = store.lookup("mail.example", "A").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value, "5.6.7.8");
}

#[tokio::test]
async fn test_damaged_record_does_not_block_others() {
    let backend = Arc::new(MemoryBackend::new());
    let store = ZoneStore::new(
        backend.clone(),
        ShardCodec::default(),
        StoreOptions::default(),
    );
    store.create_zone("example").await.unwrap();
    for record in [
        NewRecord::new("www", "A", "1.2.3.4"),
        NewRecord::new("mail", "A", "5.6.7.8"),
    ] {
        store.add_record("example", record).await.unwrap();
    }

    // Lose both snapshot shards and one data shard of the mail record
    let mut zone = store.load_document("example").await.unwrap();
    let entry = zone
        .sharded_records
        .as_ref()
        .unwrap()
        .iter()
        .find(|e| e.domain == "mail")
        .unwrap()
        .clone();
    for shard_id in &entry.shards {
        let key = shard_key(&entry.id, shard_id);
        if [0, 1, 3].contains(&zone.shards[&key].position()) {
            zone.shards.remove(&key);
        }
    }
    backend.store("example", &zone).await.unwrap();

    let found = store.lookup("www.example", "A").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].value, "1.2.3.4");
    assert!(store.lookup("mail.example", "A").await.is_err());
    assert!(store.records("example").await.is_err());
}

#[tokio::test]
async fn test_any_and_wildcard_lookup() {
    let store = plain_store();
    store.create_zone("example").await.unwrap();
    for record in [
        NewRecord::new("www", "A", "1.2.3.4"),
        NewRecord::new("www", "AAAA", "2001:db8::1"),
        NewRecord::new("*", "A", "9.9.9.9"),
    ] {
        store.add_record("example", record).await.unwrap();
    }

    let any = store.lookup("www.example", "ANY").await.unwrap();
    assert_eq!(any.len(), 3);

    let wildcard = store.lookup("nothing-here.example", "A").await.unwrap();
    assert_eq!(wildcard.len(), 1);
    assert_eq!(wildcard[0].value, "9.9.9.9");
}

#[tokio::test]
async fn test_unknown_zone_lookup_is_empty() {
    let store = memory_store();
    assert!(store.lookup("www.nowhere", "A").await.unwrap().is_empty());
    assert!(store.lookup("www.bad_name", "A").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_write_paths_report_not_found() {
    let store = memory_store();
    let err = store
        .add_record("missing", NewRecord::new("www", "A", "1.2.3.4"))
        .await
        .unwrap_err();
    assert!(matches!(err, ZoneError::ZoneNotFound(_)));
    assert!(store.delete_zone("missing").await.unwrap_err().is_not_found());

    store.create_zone("example").await.unwrap();
    let err = store
        .delete_record("example", "www", "A")
        .await
        .unwrap_err();
    assert!(matches!(err, ZoneError::RecordNotFound { .. }));
}

#[tokio::test]
async fn test_invalid_names_rejected() {
    let store = memory_store();
    assert!(matches!(
        store.create_zone("../escape").await,
        Err(ZoneError::InvalidName(_))
    ));
    assert!(matches!(
        store.create_zone("two.labels").await,
        Err(ZoneError::InvalidName(_))
    ));
}

#[tokio::test]
async fn test_delete_zone_cascades() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.create_zone("example").await.unwrap();
    store
        .add_record("example", NewRecord::new("www", "A", "1.2.3.4"))
        .await
        .unwrap();

    let path = dir.path().join("example.json");
    assert!(path.exists());

    store.delete_zone("example").await.unwrap();
    assert!(!path.exists());
    assert!(store.summary("example").is_none());
    assert!(store.list_zones().is_empty());
    assert!(store.get_zone("example").await.unwrap_err().is_not_found());
    assert!(store.lookup("www.example", "A").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persisted_document_shape() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.create_zone("example").await.unwrap();
    store
        .add_record(
            "example",
            NewRecord::new("@", "MX", "mail.example.").with_priority(10),
        )
        .await
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join("example.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(json["meta"]["sharded"], true);
    assert_eq!(json["meta"]["recordCount"], 1);
    assert_eq!(json["records"].as_array().unwrap().len(), 0);

    let entry = &json["shardedRecords"][0];
    assert_eq!(entry["domain"], "@");
    assert_eq!(entry["type"], "MX");
    assert_eq!(entry["threshold"], 4);

    let shards = json["shards"].as_object().unwrap();
    assert_eq!(shards.len(), 8);
    let snapshots = shards
        .values()
        .filter(|s| s["verification"].get("encryptedData").is_some())
        .count();
    assert_eq!(snapshots, 1);
    assert!(shards.values().all(|s| s["signature"].is_string()));
}

#[tokio::test]
async fn test_reload_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = file_store(dir.path());
        store.create_zone("alpha").await.unwrap();
        store.create_zone("beta").await.unwrap();
        store
            .add_record("beta", NewRecord::new("www", "A", "10.0.0.1"))
            .await
            .unwrap();
    }

    let store = file_store(dir.path());
    assert_eq!(store.load_all().await.unwrap(), 2);

    let zones = store.list_zones();
    assert_eq!(zones[0].0, "alpha");
    assert_eq!(zones[1].0, "beta");
    assert_eq!(zones[1].1.record_count, 1);
    assert!(zones[1].1.sharded);

    let found = store.lookup("www.beta", "A").await.unwrap();
    assert_eq!(found[0].value, "10.0.0.1");
}

#[tokio::test]
async fn test_load_all_skips_corrupt_zone() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();

    let store = file_store(dir.path());
    store.create_zone("good").await.unwrap();

    assert_eq!(store.load_all().await.unwrap(), 1);
    assert!(store.summary("good").is_some());
    assert!(store.summary("broken").is_none());
}

#[tokio::test]
async fn test_shards_from_a_different_key_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(dir.path());
    store.create_zone("example").await.unwrap();
    store
        .add_record("example", NewRecord::new("www", "A", "1.2.3.4"))
        .await
        .unwrap();

    let foreign = fractal_dns::zone::ZoneStore::new(
        Arc::new(fractal_dns::zone::FileBackend::new(dir.path())),
        fractal_dns::shard::ShardCodec::new(Some(b"some-other-key".to_vec())),
        Default::default(),
    );
    let err = foreign.lookup("www.example", "A").await.unwrap_err();
    assert!(matches!(err, ZoneError::Shard(_)));
}

#[tokio::test]
async fn test_save_zone_accepts_plain_document() {
    let store = memory_store();
    store.create_zone("example").await.unwrap();

    let mut zone = Zone::new(Utc::now(), 8);
    zone.upsert(NewRecord::new("www", "A", "1.2.3.4"), Utc::now());
    zone.upsert(NewRecord::new("@", "TXT", "hello"), Utc::now());

    let saved = store.save_zone("example", zone).await.unwrap();
    assert!(saved.meta.sharded);
    assert_eq!(saved.meta.record_count, 2);

    let stored = store.load_document("example").await.unwrap();
    assert!(stored.records.is_empty());
    assert_eq!(stored.sharded_records.unwrap().len(), 2);
    assert_eq!(store.records("example").await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_all_survive() {
    let store = Arc::new(memory_store());
    store.create_zone("example").await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .add_record(
                    "example",
                    NewRecord::new(&format!("host{}", i), "A", &format!("10.0.0.{}", i)),
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let records = store.records("example").await.unwrap();
    assert_eq!(records.len(), 16);
    assert_eq!(store.summary("example").unwrap().record_count, 16);
}

#[tokio::test]
async fn test_export_text() {
    let store = memory_store();
    store.create_zone("example").await.unwrap();
    for record in [
        NewRecord::new("www", "A", "1.2.3.4").with_ttl(300),
        NewRecord::new("@", "MX", "mail.example.").with_priority(20),
        NewRecord::new("_sip._tcp", "SRV", "10 5 5060 sip.example."),
    ] {
        store.add_record("example", record).await.unwrap();
    }

    let text = store.export_text("example").await.unwrap();
    assert!(text.starts_with("$ORIGIN example.\n$TTL 3600\n@ IN SOA ns1.example. hostmaster.example. ("));
    assert!(text.contains("@ IN NS ns1.example.\n@ IN NS ns2.example.\n"));
    assert!(text.contains("www 300 IN A 1.2.3.4\n"));
    assert!(text.contains("@ 3600 IN MX 20 mail.example.\n"));
    assert!(text.contains("; _sip._tcp 3600 IN SRV 10 5 5060 sip.example. ; unsupported record type\n"));
}

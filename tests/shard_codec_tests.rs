mod common;

use common::{SIGNING_KEY, sample_payload};
use fractal_dns::shard::{Shard, ShardCodec, ShardError};

#[test]
fn test_round_trip_various_sizes() {
    let codec = ShardCodec::default();
    for len in [0, 1, 3, 1000, 4099] {
        let payload = sample_payload(len);
        let shards = codec.split(&payload, 8, 4).unwrap();
        assert_eq!(shards.len(), 8);
        assert_eq!(codec.reconstruct(&shards).unwrap(), payload, "len {}", len);
    }
}

#[test]
fn test_snapshot_pair_alone_recovers() {
    let codec = ShardCodec::default();
    let payload = sample_payload(777);
    let shards = codec.split(&payload, 8, 4).unwrap();

    let pair: Vec<Shard> = shards
        .iter()
        .filter(|s| s.position() < 2)
        .cloned()
        .collect();
    assert_eq!(pair.len(), 2);
    assert_eq!(codec.reconstruct(&pair).unwrap(), payload);
}

#[test]
fn test_corrupt_chunk_falls_back_to_snapshot() {
    let codec = ShardCodec::default();
    let payload = sample_payload(1000);
    let mut shards = codec.split(&payload, 8, 4).unwrap();
    shards[2].data_mut()[0] ^= 0xff;

    assert_eq!(codec.reconstruct(&shards).unwrap(), payload);
}

#[test]
fn test_corrupt_chunk_without_snapshot_is_integrity_failure() {
    let codec = ShardCodec::default();
    let payload = sample_payload(1000);
    let mut shards = codec.split(&payload, 8, 4).unwrap();
    shards[2].data_mut()[0] ^= 0xff;
    shards[0].verification_mut().encrypted_data = None;

    let err = codec.reconstruct(&shards).unwrap_err();
    assert!(matches!(err, ShardError::IntegrityFailure { .. }));
}

#[test]
fn test_tampered_snapshot_is_not_trusted() {
    let codec = ShardCodec::default();
    let payload = sample_payload(1000);
    let mut shards = codec.split(&payload, 8, 4).unwrap();
    if let Some(sealed) = shards[0].verification_mut().encrypted_data.as_mut() {
        sealed.auth_tag = "00".repeat(16);
    }

    // Data shard 3 is gone, so only the snapshot could help
    let partial: Vec<Shard> = shards.into_iter().filter(|s| s.position() != 3).collect();
    assert_eq!(
        codec.reconstruct(&partial).unwrap_err(),
        ShardError::InsufficientShards { have: 3, need: 4 }
    );
}

#[test]
fn test_parity_does_not_substitute_for_data() {
    let codec = ShardCodec::default();
    let payload = sample_payload(1000);
    let shards = codec.split(&payload, 8, 4).unwrap();

    let without_snapshot_pair: Vec<Shard> =
        shards.into_iter().filter(|s| s.position() >= 2).collect();
    assert_eq!(
        codec.reconstruct(&without_snapshot_pair).unwrap_err(),
        ShardError::InsufficientShards { have: 2, need: 4 }
    );
}

#[test]
fn test_forged_signature_is_discarded() {
    let codec = ShardCodec::new(Some(SIGNING_KEY.to_vec()));
    let payload = sample_payload(500);
    let mut shards = codec.split(&payload, 8, 4).unwrap();
    assert!(shards.iter().all(|s| codec.verify_signature(s)));

    shards[3].set_signature("00".repeat(32));
    assert!(!codec.verify_signature(&shards[3]));

    // The snapshot pair still verifies, so the payload survives
    assert_eq!(codec.reconstruct(&shards).unwrap(), payload);

    // Without it the forged shard leaves a gap
    let rest: Vec<Shard> = shards.into_iter().filter(|s| s.position() >= 2).collect();
    assert!(matches!(
        codec.reconstruct(&rest),
        Err(ShardError::InsufficientShards { .. })
    ));
}

#[test]
fn test_unsigned_shards_rejected_by_signing_codec() {
    let shards = ShardCodec::default().split(b"v=spf1 -all", 8, 4).unwrap();
    let signing = ShardCodec::new(Some(SIGNING_KEY.to_vec()));
    assert!(signing.reconstruct(&shards).is_err());
}

#[test]
fn test_json_round_trip_of_shard_set() {
    let codec = ShardCodec::new(Some(SIGNING_KEY.to_vec()));
    let payload = sample_payload(321);
    let shards = codec.split(&payload, 6, 3).unwrap();

    let json = serde_json::to_string(&shards).unwrap();
    let decoded: Vec<Shard> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, shards);
    assert_eq!(codec.reconstruct(&decoded).unwrap(), payload);
}

//! Shared fixtures for rotator integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use jwks_rotator::{
    FixedClock, JwksPublisher, MemoryObjectStore, RotationContext, RotationHandler,
};
use keywarden_config::{JwksLocation, RotationPolicy};
use keywarden_keys::{
    init_memory_key_store, KeyRecord, KeyStore, MemorySecretBackend, Stage, StoreWrite,
};
use keywarden_types::{JsonWebKeySet, KeyAlgorithm, KeySpec};
use std::sync::Arc;

pub const SECRET_ID: &str = "arn:aws:secretsmanager:eu-west-1:123456789012:secret:jwt-signing";
pub const MIN_ACTIVATION_GRACE_SECONDS: u64 = 86_400;
pub const MAX_TOKEN_VALIDITY_SECONDS: u64 = 3_600;
pub const CLEANUP_GRACE_SECONDS: u64 = 600;

pub fn policy() -> RotationPolicy {
    RotationPolicy {
        min_activation_grace_period_seconds: MIN_ACTIVATION_GRACE_SECONDS,
        max_token_validity_duration_seconds: MAX_TOKEN_VALIDITY_SECONDS,
        min_key_cleanup_grace_period_seconds: CLEANUP_GRACE_SECONDS,
    }
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()
}

pub fn key_spec() -> KeySpec {
    KeySpec::ec(KeyAlgorithm::ES256)
}

/// A fresh ES256 key created at `created_at`
pub fn key_created_at(created_at: DateTime<Utc>) -> KeyRecord {
    keywarden_keys::generate_at(&key_spec(), created_at).unwrap()
}

pub struct Harness {
    pub backend: Arc<MemorySecretBackend>,
    pub key_store: Arc<KeyStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub clock: Arc<FixedClock>,
    pub context: Arc<RotationContext>,
    pub handler: RotationHandler,
}

impl Harness {
    pub fn new() -> Self {
        let (key_store, backend) = init_memory_key_store();
        let objects = Arc::new(MemoryObjectStore::new());
        let clock = Arc::new(FixedClock::new(start()));
        let publisher = JwksPublisher::new(
            objects.clone(),
            JwksLocation {
                bucket: "jwks-bucket".to_string(),
                object_key: ".well-known/jwks.json".to_string(),
            },
        );
        let context = Arc::new(RotationContext::new(
            key_store.clone(),
            publisher,
            clock.clone(),
            policy(),
            key_spec(),
        ));
        let handler = RotationHandler::new(context.clone());

        Self {
            backend,
            key_store,
            objects,
            clock,
            context,
            handler,
        }
    }

    /// Store a record directly, bypassing the rotation steps
    pub async fn seed(&self, version_id: &str, stages: &[Stage], record: &KeyRecord) {
        self.key_store
            .put(SECRET_ID, version_id, stages, record)
            .await
            .unwrap();
    }

    /// Seed an activated AWSCURRENT key, activated `age` before now
    pub async fn seed_current(&self, version_id: &str, age: Duration) -> KeyRecord {
        let activated_at = self.clock_now() - age;
        let record = key_created_at(activated_at - Duration::days(2)).activated(activated_at);
        self.seed(version_id, &[Stage::Current], &record).await;
        record
    }

    /// Forget every write made so far
    pub async fn reset_journals(&self) {
        self.backend.clear_writes().await;
        self.objects.clear_puts().await;
    }

    pub async fn store_writes(&self) -> Vec<StoreWrite> {
        self.backend.writes().await
    }

    pub async fn published(&self) -> JsonWebKeySet {
        self.context.publisher().load().await.unwrap()
    }

    pub async fn record_at(&self, stage: Stage) -> Option<KeyRecord> {
        self.key_store
            .get(SECRET_ID, keywarden_keys::VersionSelector::Stage(stage))
            .await
            .unwrap()
            .map(|stored| stored.record)
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        use jwks_rotator::Clock;
        self.clock.now()
    }
}

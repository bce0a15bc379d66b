//! Rotation lifecycle steps
//!
//! Each step reads stage contents, writes through the key store, and then
//! republishes the JWKS so the public document follows store state after
//! every mutation. Steps are safe to redeliver with the same token: writes are
//! keyed by the token (or a token derived from it) and carry the same payload
//! on replay.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::clock::Clock;
use crate::jwks::{JwksBuilder, JwksOverrides};
use crate::publisher::JwksPublisher;
use crate::storage::StorageError;
use crate::token::{sign_probe_token, verify_with_jwks, TokenError};
use chrono::{DateTime, Utc};
use keywarden_config::RotationPolicy;
use keywarden_keys::{KeyError, KeyRecord, KeyStore, Stage, StoredKey, VersionSelector};
use keywarden_types::{JsonWebKeySet, KeySpec, TypesError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const NEXT_CREATED_ABORT_REASON: &str = "Created NEXT key. Aborting rotation as requested.";

/// How a step ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// The step did useful work but the rotation must be retried later
    AbortedPendingRetry(String),
}

/// Step failures
#[derive(Error, Debug)]
pub enum RotationError {
    #[error("Next key is too new: {kid} is {age_seconds}s old, activation requires {required_seconds}s")]
    NextKeyTooNew {
        kid: String,
        age_seconds: i64,
        required_seconds: u64,
    },

    #[error("Current version not found")]
    CurrentVersionNotFound,

    #[error("AWSPENDING version not found for token {0}")]
    PendingVersionNotFound(String),

    #[error("No keys found in JWKS document")]
    EmptyJwks,

    #[error("Failed to sign test token: {0}")]
    Signing(#[source] TokenError),

    #[error("Failed to verify test token against JWKS: {0}")]
    Verification(#[source] TokenError),

    #[error("Key generation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Event(#[from] TypesError),
}

pub type RotationResult = Result<StepOutcome, RotationError>;

/// Idempotency token for the NEXT key written alongside `version_id`
pub fn next_key_token(version_id: &str) -> String {
    format!("next-key-{}", version_id)
}

/// Long-lived handles and policy shared by every step
pub struct RotationContext {
    key_store: Arc<KeyStore>,
    publisher: JwksPublisher,
    clock: Arc<dyn Clock>,
    policy: RotationPolicy,
    key_spec: KeySpec,
}

impl RotationContext {
    pub fn new(
        key_store: Arc<KeyStore>,
        publisher: JwksPublisher,
        clock: Arc<dyn Clock>,
        policy: RotationPolicy,
        key_spec: KeySpec,
    ) -> Self {
        Self {
            key_store,
            publisher,
            clock,
            policy,
            key_spec,
        }
    }

    pub fn key_store(&self) -> &Arc<KeyStore> {
        &self.key_store
    }

    pub fn publisher(&self) -> &JwksPublisher {
        &self.publisher
    }

    pub fn jwks_builder(&self) -> JwksBuilder {
        JwksBuilder::new(self.key_store.clone(), self.clock.clone(), self.policy)
    }

    /// Rebuild the JWKS for `secret_id` and overwrite the published document
    pub async fn republish(
        &self,
        secret_id: &str,
        overrides: &JwksOverrides,
    ) -> Result<JsonWebKeySet, RotationError> {
        let jwks = self.jwks_builder().build(secret_id, overrides).await?;
        Ok(self.publisher.publish(jwks).await?)
    }

    async fn generate(&self, now: DateTime<Utc>) -> Result<KeyRecord, RotationError> {
        let spec = self.key_spec.clone();
        let record =
            tokio::task::spawn_blocking(move || keywarden_keys::generate_at(&spec, now)).await??;
        Ok(record)
    }

    async fn pending_for_token(
        &self,
        secret_id: &str,
        token: &str,
    ) -> Result<Option<StoredKey>, RotationError> {
        Ok(self
            .key_store
            .get(
                secret_id,
                VersionSelector::Version {
                    version_id: token,
                    stage: Stage::Pending,
                },
            )
            .await?)
    }

    /// Promote NEXT (or a bootstrap key) to AWSPENDING and stage a new NEXT
    pub async fn create_secret(&self, secret_id: &str, token: &str) -> RotationResult {
        let now = self.clock.now();
        let current = self
            .key_store
            .get(secret_id, VersionSelector::Stage(Stage::Current))
            .await?;

        if let Some(pending) = self.pending_for_token(secret_id, token).await? {
            info!(
                secret_id = %secret_id,
                token = %token,
                kid = %pending.record.kid,
                "AWSPENDING already staged for token, converging"
            );
            return self
                .stage_pending(secret_id, token, current, pending.record, now)
                .await;
        }

        let next = self
            .key_store
            .get(secret_id, VersionSelector::Stage(Stage::Next))
            .await?;

        let candidate = match next {
            Some(next) => {
                let age = next.record.age(now);
                let required = self.policy.min_activation_grace_period_seconds;
                if i128::from(age.num_milliseconds()) < i128::from(required) * 1000 {
                    return Err(RotationError::NextKeyTooNew {
                        kid: next.record.kid,
                        age_seconds: age.num_seconds(),
                        required_seconds: required,
                    });
                }
                debug!(kid = %next.record.kid, age_seconds = age.num_seconds(), "Promoting NEXT key");
                next.record
            }
            None => match current {
                Some(ref current) if current.record.is_activated() => {
                    return self.create_next_and_abort(secret_id, current, now).await;
                }
                _ => {
                    info!(secret_id = %secret_id, "No NEXT or active key, bootstrapping");
                    self.generate(now).await?
                }
            },
        };

        self.stage_pending(secret_id, token, current, candidate.activated(now), now)
            .await
    }

    async fn create_next_and_abort(
        &self,
        secret_id: &str,
        current: &StoredKey,
        now: DateTime<Utc>,
    ) -> RotationResult {
        let record = self.generate(now).await?;
        self.key_store
            .put(
                secret_id,
                &next_key_token(&current.version_id),
                &[Stage::Next],
                &record,
            )
            .await?;

        self.republish(
            secret_id,
            &JwksOverrides {
                next: Some(record.clone()),
                ..Default::default()
            },
        )
        .await?;

        warn!(
            secret_id = %secret_id,
            kid = %record.kid,
            "Created NEXT key, rotation must be retried after the activation grace period"
        );
        Ok(StepOutcome::AbortedPendingRetry(
            NEXT_CREATED_ABORT_REASON.to_string(),
        ))
    }

    async fn stage_pending(
        &self,
        secret_id: &str,
        token: &str,
        current: Option<StoredKey>,
        pending: KeyRecord,
        now: DateTime<Utc>,
    ) -> RotationResult {
        self.key_store
            .put(secret_id, token, &[Stage::Pending], &pending)
            .await?;

        let replacement_token = next_key_token(token);
        let replacement = match self
            .key_store
            .get(secret_id, VersionSelector::Stage(Stage::Next))
            .await?
        {
            Some(next) if next.version_id == replacement_token => next.record,
            _ => {
                let record = self.generate(now).await?;
                self.key_store
                    .put(secret_id, &replacement_token, &[Stage::Next], &record)
                    .await?;
                record
            }
        };

        let previous = current
            .filter(|current| current.version_id != token)
            .map(|current| current.record);

        info!(
            secret_id = %secret_id,
            token = %token,
            pending_kid = %pending.kid,
            next_kid = %replacement.kid,
            "Staged pending key"
        );

        self.republish(
            secret_id,
            &JwksOverrides {
                next: Some(replacement),
                current: Some(pending),
                previous,
            },
        )
        .await?;

        Ok(StepOutcome::Completed)
    }

    /// Nothing to configure downstream; verifiers read the JWKS
    pub async fn set_secret(&self, secret_id: &str, token: &str) -> RotationResult {
        debug!(secret_id = %secret_id, token = %token, "setSecret is a no-op");
        Ok(StepOutcome::Completed)
    }

    /// Prove the pending key verifies against the published JWKS
    pub async fn test_secret(&self, secret_id: &str, token: &str) -> RotationResult {
        let pending = self
            .pending_for_token(secret_id, token)
            .await?
            .ok_or_else(|| RotationError::PendingVersionNotFound(token.to_string()))?;

        let now = self.clock.now();
        let probe = sign_probe_token(&pending.record, now).map_err(RotationError::Signing)?;

        let jwks = self.publisher.load().await?;
        if jwks.is_empty() {
            return Err(RotationError::EmptyJwks);
        }

        verify_with_jwks(&probe, &jwks, now).map_err(RotationError::Verification)?;

        info!(
            secret_id = %secret_id,
            token = %token,
            kid = %pending.record.kid,
            "Pending key verified against published JWKS"
        );
        Ok(StepOutcome::Completed)
    }

    /// Move AWSCURRENT onto the pending version
    pub async fn finish_secret(&self, secret_id: &str, token: &str) -> RotationResult {
        let current = self
            .key_store
            .get(secret_id, VersionSelector::Stage(Stage::Current))
            .await?
            .ok_or(RotationError::CurrentVersionNotFound)?;

        let pending = self
            .pending_for_token(secret_id, token)
            .await?
            .ok_or_else(|| RotationError::PendingVersionNotFound(token.to_string()))?;

        if current.version_id == pending.version_id {
            info!(
                secret_id = %secret_id,
                version_id = %current.version_id,
                "Pending version is already current"
            );
            self.republish(secret_id, &JwksOverrides::default()).await?;
            return Ok(StepOutcome::Completed);
        }

        self.key_store
            .move_stage(
                secret_id,
                Stage::Current,
                &current.version_id,
                &pending.version_id,
            )
            .await?;

        info!(
            secret_id = %secret_id,
            from = %current.version_id,
            to = %pending.version_id,
            kid = %pending.record.kid,
            "Rotation finished"
        );

        self.republish(
            secret_id,
            &JwksOverrides {
                next: None,
                current: Some(pending.record),
                previous: Some(current.record),
            },
        )
        .await?;

        Ok(StepOutcome::Completed)
    }
}

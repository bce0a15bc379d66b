//! JWKS derivation from stage contents
//!
//! Up to three keys are published, in this order:
//! - NEXT, always, so verifiers cache it before it signs anything
//! - AWSCURRENT, once activated
//! - AWSPREVIOUS, once activated and only while tokens it signed can still be
//!   valid: `now - current.activatedAt <= maxTokenValidity + cleanupGrace`.
//!   When the current activation time is unknown the previous key stays.
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
use chrono::{DateTime, Utc};
use keywarden_config::RotationPolicy;
use keywarden_keys::{KeyRecord, KeyResult, KeyStore, Stage, VersionSelector};
use keywarden_types::JsonWebKeySet;
use std::sync::Arc;
use tracing::debug;

/// Stage contents to use instead of reading the store
///
/// `None` means "read the stage".
#[derive(Debug, Clone, Default)]
pub struct JwksOverrides {
    pub next: Option<KeyRecord>,
    pub current: Option<KeyRecord>,
    pub previous: Option<KeyRecord>,
}

/// Builds the publishable key set for a secret
#[derive(Clone)]
pub struct JwksBuilder {
    key_store: Arc<KeyStore>,
    clock: Arc<dyn Clock>,
    policy: RotationPolicy,
}

impl JwksBuilder {
    pub fn new(key_store: Arc<KeyStore>, clock: Arc<dyn Clock>, policy: RotationPolicy) -> Self {
        Self {
            key_store,
            clock,
            policy,
        }
    }

    pub async fn build(&self, secret_id: &str, overrides: &JwksOverrides) -> KeyResult<JsonWebKeySet> {
        let next = self
            .resolve(secret_id, Stage::Next, overrides.next.as_ref())
            .await?;
        let current = self
            .resolve(secret_id, Stage::Current, overrides.current.as_ref())
            .await?;
        let previous = self
            .resolve(secret_id, Stage::Previous, overrides.previous.as_ref())
            .await?;

        Ok(assemble(
            next.as_ref(),
            current.as_ref(),
            previous.as_ref(),
            self.clock.now(),
            &self.policy,
        ))
    }

    async fn resolve(
        &self,
        secret_id: &str,
        stage: Stage,
        supplied: Option<&KeyRecord>,
    ) -> KeyResult<Option<KeyRecord>> {
        if let Some(record) = supplied {
            return Ok(Some(record.clone()));
        }
        Ok(self
            .key_store
            .get(secret_id, VersionSelector::Stage(stage))
            .await?
            .map(|stored| stored.record))
    }
}

/// Apply the inclusion rules to already-resolved stage contents
pub fn assemble(
    next: Option<&KeyRecord>,
    current: Option<&KeyRecord>,
    previous: Option<&KeyRecord>,
    now: DateTime<Utc>,
    policy: &RotationPolicy,
) -> JsonWebKeySet {
    let mut jwks = JsonWebKeySet::default();

    if let Some(next) = next {
        jwks.keys.push(next.to_jwk());
    }

    if let Some(current) = current {
        if current.is_activated() {
            jwks.keys.push(current.to_jwk());
        } else {
            debug!(kid = %current.kid, "Skipping current key that was never activated");
        }
    }

    if let Some(previous) = previous {
        if previous_key_included(previous, current, now, policy) {
            jwks.keys.push(previous.to_jwk());
        } else {
            debug!(kid = %previous.kid, "Dropping previous key from JWKS");
        }
    }

    jwks
}

/// Whether the previous key is still needed by verifiers
pub fn previous_key_included(
    previous: &KeyRecord,
    current: Option<&KeyRecord>,
    now: DateTime<Utc>,
    policy: &RotationPolicy,
) -> bool {
    if !previous.is_activated() {
        return false;
    }

    let since_activation = match current.and_then(|c| c.time_since_activation(now)) {
        Some(elapsed) => elapsed,
        None => return true,
    };

    let elapsed_ms = i128::from(since_activation.num_milliseconds());
    let retention_ms = i128::from(policy.previous_key_retention_seconds()) * 1000;
    elapsed_ms <= retention_ms
}

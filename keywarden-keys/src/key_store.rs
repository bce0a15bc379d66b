//! Typed key store over a secret backend
//!
//! Callers deal in [`KeyRecord`]s; this layer owns the JSON encoding of the
//! secret string and turns malformed payloads into errors instead of letting
//! them surface later as signing failures.
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


use crate::backend::SecretBackend;
use crate::error::{KeyError, KeyResult};
use crate::key_types::{KeyRecord, Stage, StoredKey, VersionSelector};
use std::sync::Arc;
use tracing::{debug, info};

/// High-level key store that wraps a secret backend
pub struct KeyStore {
    backend: Arc<dyn SecretBackend>,
}

impl KeyStore {
    /// Create a new key store with a secret backend
    pub fn new(backend: Arc<dyn SecretBackend>) -> Self {
        Self { backend }
    }

    /// Read one key record, `None` when the selector matches nothing
    pub async fn get(
        &self,
        secret_id: &str,
        selector: VersionSelector<'_>,
    ) -> KeyResult<Option<StoredKey>> {
        let stage = selector.stage();
        let version = match self
            .backend
            .get_secret_value(secret_id, selector.version_id(), stage)
            .await?
        {
            Some(version) => version,
            None => {
                debug!(secret_id = %secret_id, stage = %stage, "No key at stage");
                return Ok(None);
            }
        };

        let record: KeyRecord =
            serde_json::from_str(&version.secret_string).map_err(|e| KeyError::InvalidRecord {
                secret_id: secret_id.to_string(),
                version_id: version.version_id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Some(StoredKey {
            version_id: version.version_id,
            record,
        }))
    }

    /// Write `record` as the version identified by `token` carrying `stages`
    pub async fn put(
        &self,
        secret_id: &str,
        token: &str,
        stages: &[Stage],
        record: &KeyRecord,
    ) -> KeyResult<String> {
        let payload = serde_json::to_string(record)?;

        info!(
            secret_id = %secret_id,
            version_id = %token,
            kid = %record.kid,
            stages = ?stages,
            "Storing key record"
        );

        self.backend
            .put_secret_value(secret_id, token, &payload, stages)
            .await
    }

    /// Move a stage label from one version to another
    pub async fn move_stage(
        &self,
        secret_id: &str,
        stage: Stage,
        from_version_id: &str,
        to_version_id: &str,
    ) -> KeyResult<()> {
        info!(
            secret_id = %secret_id,
            stage = %stage,
            from = %from_version_id,
            to = %to_version_id,
            "Moving stage"
        );

        self.backend
            .update_secret_version_stage(secret_id, stage, from_version_id, to_version_id)
            .await
    }
}

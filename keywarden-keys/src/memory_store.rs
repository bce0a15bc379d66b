//! In-memory staged secret store
//!
//! Follows the staging rules of AWS Secrets Manager closely enough to run the
//! whole rotation flow without AWS: every version is immutable, a stage
//! labels at most one version, and moving AWSCURRENT leaves AWSPREVIOUS on
//! the version it came from. Every write call is journaled so tests can
//! assert exactly what the rotator wrote.
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


use crate::backend::{SecretBackend, SecretVersion};
use crate::error::{KeyError, KeyResult};
use crate::key_types::Stage;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// A write call received by the store, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Put {
        secret_id: String,
        version_id: String,
        stages: Vec<Stage>,
    },
    MoveStage {
        secret_id: String,
        stage: Stage,
        from: String,
        to: String,
    },
}

#[derive(Debug, Default)]
struct SecretState {
    /// version id -> secret string
    versions: HashMap<String, String>,
    /// stage -> version id
    stages: HashMap<Stage, String>,
}

impl SecretState {
    fn attach(&mut self, stage: Stage, version_id: &str) {
        if stage == Stage::Current {
            if let Some(displaced) = self.stages.get(&Stage::Current).cloned() {
                if displaced != version_id {
                    self.stages.insert(Stage::Previous, displaced);
                }
            }
        }
        self.stages.insert(stage, version_id.to_string());
    }
}

/// In-memory [`SecretBackend`]
#[derive(Debug, Default)]
pub struct MemorySecretBackend {
    secrets: RwLock<HashMap<String, SecretState>>,
    journal: RwLock<Vec<StoreWrite>>,
}

impl MemorySecretBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write calls received so far
    pub async fn writes(&self) -> Vec<StoreWrite> {
        self.journal.read().await.clone()
    }

    pub async fn clear_writes(&self) {
        self.journal.write().await.clear();
    }

    /// Version currently labelled `stage`
    pub async fn version_for_stage(&self, secret_id: &str, stage: Stage) -> Option<String> {
        let secrets = self.secrets.read().await;
        secrets
            .get(secret_id)
            .and_then(|state| state.stages.get(&stage).cloned())
    }

    /// Stages attached to a version, in stage order
    pub async fn stages_for_version(&self, secret_id: &str, version_id: &str) -> Vec<Stage> {
        let secrets = self.secrets.read().await;
        let mut stages: Vec<Stage> = secrets
            .get(secret_id)
            .map(|state| {
                state
                    .stages
                    .iter()
                    .filter(|(_, v)| v.as_str() == version_id)
                    .map(|(stage, _)| *stage)
                    .collect()
            })
            .unwrap_or_default();
        stages.sort();
        stages
    }

    /// Number of versions ever written for a secret
    pub async fn version_count(&self, secret_id: &str) -> usize {
        let secrets = self.secrets.read().await;
        secrets
            .get(secret_id)
            .map(|state| state.versions.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl SecretBackend for MemorySecretBackend {
    async fn get_secret_value(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
        stage: Stage,
    ) -> KeyResult<Option<SecretVersion>> {
        let secrets = self.secrets.read().await;
        let state = match secrets.get(secret_id) {
            Some(state) => state,
            None => return Ok(None),
        };

        let labelled = match state.stages.get(&stage) {
            Some(version) => version,
            None => return Ok(None),
        };

        if let Some(requested) = version_id {
            if requested != labelled {
                return Ok(None);
            }
        }

        Ok(state.versions.get(labelled).map(|secret_string| SecretVersion {
            version_id: labelled.clone(),
            secret_string: secret_string.clone(),
        }))
    }

    async fn put_secret_value(
        &self,
        secret_id: &str,
        client_request_token: &str,
        secret_string: &str,
        stages: &[Stage],
    ) -> KeyResult<String> {
        self.journal.write().await.push(StoreWrite::Put {
            secret_id: secret_id.to_string(),
            version_id: client_request_token.to_string(),
            stages: stages.to_vec(),
        });

        let mut secrets = self.secrets.write().await;
        let state = secrets.entry(secret_id.to_string()).or_default();

        if let Some(existing) = state.versions.get(client_request_token) {
            if existing == secret_string {
                debug!(
                    secret_id = %secret_id,
                    version_id = %client_request_token,
                    "Replayed put with identical payload"
                );
                return Ok(client_request_token.to_string());
            }
            return Err(KeyError::IdempotencyConflict(client_request_token.to_string()));
        }

        state
            .versions
            .insert(client_request_token.to_string(), secret_string.to_string());
        for stage in stages {
            state.attach(*stage, client_request_token);
        }

        Ok(client_request_token.to_string())
    }

    async fn update_secret_version_stage(
        &self,
        secret_id: &str,
        stage: Stage,
        remove_from_version_id: &str,
        move_to_version_id: &str,
    ) -> KeyResult<()> {
        self.journal.write().await.push(StoreWrite::MoveStage {
            secret_id: secret_id.to_string(),
            stage,
            from: remove_from_version_id.to_string(),
            to: move_to_version_id.to_string(),
        });

        let mut secrets = self.secrets.write().await;
        let state = secrets
            .get_mut(secret_id)
            .ok_or_else(|| KeyError::VersionNotFound(format!("{}:{}", secret_id, move_to_version_id)))?;

        if !state.versions.contains_key(move_to_version_id) {
            return Err(KeyError::VersionNotFound(format!(
                "{}:{}",
                secret_id, move_to_version_id
            )));
        }

        if state.stages.get(&stage).map(String::as_str) != Some(remove_from_version_id) {
            return Err(KeyError::StageConflict {
                stage: stage.to_string(),
                version_id: remove_from_version_id.to_string(),
            });
        }

        state.attach(stage, move_to_version_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_secret_reads_as_none() {
        let store = MemorySecretBackend::new();
        let value = store
            .get_secret_value("jwt", None, Stage::Current)
            .await
            .unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_put_moves_stage_labels() {
        let store = MemorySecretBackend::new();
        store
            .put_secret_value("jwt", "v1", "one", &[Stage::Next])
            .await
            .unwrap();
        store
            .put_secret_value("jwt", "v2", "two", &[Stage::Next])
            .await
            .unwrap();

        let next = store
            .get_secret_value("jwt", None, Stage::Next)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.version_id, "v2");
        assert_eq!(next.secret_string, "two");
        assert!(store.stages_for_version("jwt", "v1").await.is_empty());
    }

    #[tokio::test]
    async fn test_version_read_requires_stage() {
        let store = MemorySecretBackend::new();
        store
            .put_secret_value("jwt", "v1", "one", &[Stage::Pending])
            .await
            .unwrap();

        let hit = store
            .get_secret_value("jwt", Some("v1"), Stage::Pending)
            .await
            .unwrap();
        assert!(hit.is_some());

        let miss = store
            .get_secret_value("jwt", Some("v2"), Stage::Pending)
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_put_replay_is_idempotent() {
        let store = MemorySecretBackend::new();
        store
            .put_secret_value("jwt", "v1", "one", &[Stage::Pending])
            .await
            .unwrap();
        let version = store
            .put_secret_value("jwt", "v1", "one", &[Stage::Pending])
            .await
            .unwrap();

        assert_eq!(version, "v1");
        assert_eq!(store.version_count("jwt").await, 1);
        assert_eq!(store.writes().await.len(), 2);
    }

    #[tokio::test]
    async fn test_put_replay_with_new_payload_conflicts() {
        let store = MemorySecretBackend::new();
        store
            .put_secret_value("jwt", "v1", "one", &[Stage::Pending])
            .await
            .unwrap();
        let err = store
            .put_secret_value("jwt", "v1", "other", &[Stage::Pending])
            .await
            .unwrap_err();

        assert!(matches!(err, KeyError::IdempotencyConflict(ref token) if token == "v1"));
        assert_eq!(store.version_count("jwt").await, 1);
    }

    #[tokio::test]
    async fn test_moving_current_marks_previous() {
        let store = MemorySecretBackend::new();
        store
            .put_secret_value("jwt", "v1", "one", &[Stage::Current])
            .await
            .unwrap();
        store
            .put_secret_value("jwt", "v2", "two", &[Stage::Pending])
            .await
            .unwrap();

        tokio_test::assert_ok!(
            store
                .update_secret_version_stage("jwt", Stage::Current, "v1", "v2")
                .await
        );

        assert_eq!(
            store.version_for_stage("jwt", Stage::Current).await.as_deref(),
            Some("v2")
        );
        assert_eq!(
            store.version_for_stage("jwt", Stage::Previous).await.as_deref(),
            Some("v1")
        );
        assert_eq!(
            store.stages_for_version("jwt", "v2").await,
            vec![Stage::Pending, Stage::Current]
        );
    }

    #[tokio::test]
    async fn test_move_rejects_wrong_source_version() {
        let store = MemorySecretBackend::new();
        store
            .put_secret_value("jwt", "v1", "one", &[Stage::Current])
            .await
            .unwrap();
        store
            .put_secret_value("jwt", "v2", "two", &[Stage::Pending])
            .await
            .unwrap();

        let err = store
            .update_secret_version_stage("jwt", Stage::Current, "v2", "v1")
            .await
            .unwrap_err();
        assert!(matches!(err, KeyError::StageConflict { .. }));

        let err = store
            .update_secret_version_stage("jwt", Stage::Current, "v1", "v9")
            .await
            .unwrap_err();
        assert!(matches!(err, KeyError::VersionNotFound(_)));
    }
}

//! Versioned secret store interface
//!
//! Mirrors the three calls the rotation flow needs from a staged secret
//! store: read a version, write a new version, and move a stage label
//! between versions. Implemented by:
//! - AWS Secrets Manager ([`crate::SecretsManagerBackend`])
//! - In-memory store for tests and local runs ([`crate::MemorySecretBackend`])
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


use crate::error::KeyResult;
use crate::key_types::Stage;
use async_trait::async_trait;

/// One version of a secret as returned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretVersion {
    pub version_id: String,
    pub secret_string: String,
}

/// Trait for staged secret store backends
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// Read the version labelled `stage`, or the version `version_id` if it
    /// carries `stage`
    ///
    /// A missing secret, version or stage is `Ok(None)`.
    async fn get_secret_value(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
        stage: Stage,
    ) -> KeyResult<Option<SecretVersion>>;

    /// Create a version identified by `client_request_token` and attach
    /// `stages` to it
    ///
    /// Replaying a token with the same payload is a no-op returning the
    /// same version id.
    async fn put_secret_value(
        &self,
        secret_id: &str,
        client_request_token: &str,
        secret_string: &str,
        stages: &[Stage],
    ) -> KeyResult<String>;

    /// Move `stage` from `remove_from_version_id` to `move_to_version_id`
    async fn update_secret_version_stage(
        &self,
        secret_id: &str,
        stage: Stage,
        remove_from_version_id: &str,
        move_to_version_id: &str,
    ) -> KeyResult<()>;
}

//! Scheduled JWKS cleanup
//!
//! Rebuilds the document from live store state so keys age out once their
//! retention window closes. Never writes to the secret store.
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


use crate::jwks::JwksOverrides;
use crate::rotation::{RotationContext, RotationResult, StepOutcome};
use keywarden_keys::{Stage, VersionSelector};
use tracing::info;

impl RotationContext {
    /// Republish the JWKS without any overrides
    pub async fn cleanup(&self, secret_id: &str) -> RotationResult {
        let current = self
            .key_store()
            .get(secret_id, VersionSelector::Stage(Stage::Current))
            .await?;
        if current.is_none() {
            info!(secret_id = %secret_id, "No current key, nothing to clean up");
            return Ok(StepOutcome::Completed);
        }

        let jwks = self
            .republish(secret_id, &JwksOverrides::default())
            .await?;

        info!(
            secret_id = %secret_id,
            keys = jwks.keys.len(),
            "JWKS cleanup complete"
        );
        Ok(StepOutcome::Completed)
    }
}

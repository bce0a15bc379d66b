//! Trigger event dispatch
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


use crate::rotation::{RotationContext, RotationResult, StepOutcome};
use keywarden_types::{RotationStep, TriggerEvent};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Routes trigger events to rotation steps or cleanup
#[derive(Clone)]
pub struct RotationHandler {
    context: Arc<RotationContext>,
}

impl RotationHandler {
    pub fn new(context: Arc<RotationContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<RotationContext> {
        &self.context
    }

    /// Parse a JSON event and handle it
    pub async fn handle_json(&self, input: &str) -> RotationResult {
        let event = TriggerEvent::from_json(input)?;
        self.handle(event).await
    }

    pub async fn handle(&self, event: TriggerEvent) -> RotationResult {
        let (label, result) = match event {
            TriggerEvent::Rotation(ref rotation) => {
                info!(
                    step = %rotation.step,
                    secret_id = %rotation.secret_id,
                    token = %rotation.client_request_token,
                    "Handling rotation step"
                );

                let secret_id = rotation.secret_id.as_str();
                let token = rotation.client_request_token.as_str();
                let result = match rotation.step {
                    RotationStep::CreateSecret => self.context.create_secret(secret_id, token).await,
                    RotationStep::SetSecret => self.context.set_secret(secret_id, token).await,
                    RotationStep::TestSecret => self.context.test_secret(secret_id, token).await,
                    RotationStep::FinishSecret => self.context.finish_secret(secret_id, token).await,
                };
                (rotation.step.as_str(), result)
            }
            TriggerEvent::Cleanup(ref cleanup) => {
                info!(secret_id = %cleanup.secret_id, "Handling cleanup");
                ("cleanup", self.context.cleanup(&cleanup.secret_id).await)
            }
        };

        match result {
            Ok(StepOutcome::Completed) => {
                info!(step = label, secret_id = %event.secret_id(), "Step completed");
            }
            Ok(StepOutcome::AbortedPendingRetry(ref reason)) => {
                warn!(step = label, secret_id = %event.secret_id(), reason = %reason, "Step aborted, retry pending");
            }
            Err(ref e) => {
                error!(step = label, secret_id = %event.secret_id(), error = %e, "Step failed");
            }
        }

        result
    }
}

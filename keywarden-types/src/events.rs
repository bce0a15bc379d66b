//! Trigger event definitions delivered by the external scheduler
//!
//! Two shapes arrive: a rotation lifecycle event carrying `Step`, `SecretId`
//! and `ClientRequestToken`, and a scheduled cleanup event carrying
//! `action: "cleanup"` and `secretArn`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TypesError};

/// Rotation lifecycle step identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RotationStep {
    CreateSecret,
    SetSecret,
    TestSecret,
    FinishSecret,
}

impl RotationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStep::CreateSecret => "createSecret",
            RotationStep::SetSecret => "setSecret",
            RotationStep::TestSecret => "testSecret",
            RotationStep::FinishSecret => "finishSecret",
        }
    }
}

impl FromStr for RotationStep {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "createSecret" => Ok(RotationStep::CreateSecret),
            "setSecret" => Ok(RotationStep::SetSecret),
            "testSecret" => Ok(RotationStep::TestSecret),
            "finishSecret" => Ok(RotationStep::FinishSecret),
            other => Err(TypesError::InvalidStep(other.to_string())),
        }
    }
}

impl fmt::Display for RotationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rotation lifecycle event for one secret and one idempotency token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationEvent {
    pub step: RotationStep,
    pub secret_id: String,
    pub client_request_token: String,
}

/// A scheduled cleanup event for one secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupEvent {
    pub secret_id: String,
}

/// Any event the rotator accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    Rotation(RotationEvent),
    Cleanup(CleanupEvent),
}

#[derive(Deserialize)]
struct RawRotationEvent {
    #[serde(rename = "Step")]
    step: String,
    #[serde(rename = "SecretId")]
    secret_id: String,
    #[serde(rename = "ClientRequestToken")]
    client_request_token: String,
}

#[derive(Deserialize)]
struct RawCleanupEvent {
    #[serde(rename = "secretArn")]
    secret_arn: String,
}

impl TriggerEvent {
    /// Parse an event from its JSON text
    pub fn from_json(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Classify and parse an already-decoded JSON event
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("Step").is_some() {
            let raw: RawRotationEvent = serde_json::from_value(value)
                .map_err(|e| TypesError::InvalidPayload(e.to_string()))?;
            let step = raw.step.parse()?;
            return Ok(TriggerEvent::Rotation(RotationEvent {
                step,
                secret_id: raw.secret_id,
                client_request_token: raw.client_request_token,
            }));
        }

        match value.get("action").and_then(Value::as_str) {
            Some("cleanup") => {
                let raw: RawCleanupEvent = serde_json::from_value(value)
                    .map_err(|e| TypesError::InvalidPayload(e.to_string()))?;
                Ok(TriggerEvent::Cleanup(CleanupEvent {
                    secret_id: raw.secret_arn,
                }))
            }
            _ => Err(TypesError::InvalidEventAction),
        }
    }

    /// Secret the event targets
    pub fn secret_id(&self) -> &str {
        match self {
            TriggerEvent::Rotation(event) => &event.secret_id,
            TriggerEvent::Cleanup(event) => &event.secret_id,
        }
    }
}

//! Error types for key storage and generation
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


use keywarden_types::TypesError;
use thiserror::Error;

/// Key storage and generation errors
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Secret store error: {0}")]
    Backend(String),

    #[error("Invalid key record in {secret_id} version {version_id}: {reason}")]
    InvalidRecord {
        secret_id: String,
        version_id: String,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid key spec: {0}")]
    InvalidKeySpec(String),

    #[error("Key generation error: {0}")]
    Generation(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Stage {stage} is not attached to version {version_id}")]
    StageConflict { stage: String, version_id: String },

    #[error("Idempotency token {0} was already used with a different payload")]
    IdempotencyConflict(String),
}

impl From<TypesError> for KeyError {
    fn from(err: TypesError) -> Self {
        match err {
            TypesError::UnsupportedAlgorithm(alg) => KeyError::UnsupportedAlgorithm(alg),
            TypesError::InvalidKeySpec(reason) => KeyError::InvalidKeySpec(reason),
            TypesError::Serialization(e) => KeyError::Serialization(e),
            other => KeyError::InvalidKeySpec(other.to_string()),
        }
    }
}

/// Result type for key operations
pub type KeyResult<T> = Result<T, KeyError>;

//! Error types for Keywarden
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


use thiserror::Error;

/// Errors raised while parsing trigger events and key specifications
#[derive(Error, Debug)]
pub enum TypesError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid step: {0}")]
    InvalidStep(String),

    #[error("Invalid event action")]
    InvalidEventAction,

    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid key spec: {0}")]
    InvalidKeySpec(String),
}

pub type Result<T> = std::result::Result<T, TypesError>;

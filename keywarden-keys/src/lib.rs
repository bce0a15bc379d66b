//! Versioned key storage and key material generation for the JWKS rotator
//!
//! Key records live in a versioned secret store where each write creates an
//! immutable version and named stages (NEXT, AWSPENDING, AWSCURRENT,
//! AWSPREVIOUS) point at versions. The store is reached through the
//! [`SecretBackend`] trait so AWS Secrets Manager and the in-memory backend
//! are interchangeable.
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


pub mod error;
pub mod backend;
pub mod generator;
pub mod key_store;
pub mod key_types;
pub mod memory_store;
pub mod secrets_manager;
pub mod service_integration;

pub use backend::{SecretBackend, SecretVersion};
pub use error::{KeyError, KeyResult};
pub use generator::{generate, generate_at};
pub use key_store::KeyStore;
pub use key_types::{KeyRecord, Stage, StoredKey, VersionSelector};
pub use memory_store::{MemorySecretBackend, StoreWrite};
pub use secrets_manager::SecretsManagerBackend;
pub use service_integration::*;

//! Key store construction helpers for services
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
use crate::key_store::KeyStore;
use crate::memory_store::MemorySecretBackend;
use crate::secrets_manager::SecretsManagerBackend;
use rusoto_core::Region;
use std::sync::Arc;
use tracing::info;

/// Initialize a key store backed by AWS Secrets Manager
pub fn init_key_store(region: Region) -> KeyResult<Arc<KeyStore>> {
    info!(region = region.name(), "Initializing key store");

    let backend = Arc::new(SecretsManagerBackend::new(region)?);
    Ok(Arc::new(KeyStore::new(backend)))
}

/// Initialize a key store backed by process memory
///
/// The backend handle is returned alongside so callers can inspect stages
/// and the write journal.
pub fn init_memory_key_store() -> (Arc<KeyStore>, Arc<MemorySecretBackend>) {
    info!("Initializing in-memory key store");

    let backend = Arc::new(MemorySecretBackend::new());
    let key_store = Arc::new(KeyStore::new(backend.clone()));
    (key_store, backend)
}

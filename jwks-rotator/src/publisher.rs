//! JWKS document publication
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


use crate::storage::{ObjectPut, ObjectStore, StorageResult};
use keywarden_config::JwksLocation;
use keywarden_types::JsonWebKeySet;
use std::sync::Arc;
use tracing::info;

pub const JWKS_CONTENT_TYPE: &str = "application/json";
pub const JWKS_CACHE_CONTROL: &str = "public, max-age=3600";

/// Reads and overwrites the well-known JWKS object
#[derive(Clone)]
pub struct JwksPublisher {
    store: Arc<dyn ObjectStore>,
    location: JwksLocation,
}

impl JwksPublisher {
    pub fn new(store: Arc<dyn ObjectStore>, location: JwksLocation) -> Self {
        Self { store, location }
    }

    pub fn location(&self) -> &JwksLocation {
        &self.location
    }

    /// Overwrite the published document, last writer wins
    pub async fn publish(&self, jwks: JsonWebKeySet) -> StorageResult<JsonWebKeySet> {
        let body = serde_json::to_vec_pretty(&jwks)?;

        self.store
            .put_object(ObjectPut {
                bucket: self.location.bucket.clone(),
                key: self.location.object_key.clone(),
                body,
                content_type: JWKS_CONTENT_TYPE.to_string(),
                cache_control: JWKS_CACHE_CONTROL.to_string(),
            })
            .await?;

        info!(
            bucket = %self.location.bucket,
            key = %self.location.object_key,
            keys = ?jwks.kids(),
            "Published JWKS"
        );

        Ok(jwks)
    }

    /// Read the published document, empty when nothing has been published
    pub async fn load(&self) -> StorageResult<JsonWebKeySet> {
        match self
            .store
            .get_object(&self.location.bucket, &self.location.object_key)
            .await?
        {
            Some(body) => Ok(serde_json::from_slice(&body)?),
            None => Ok(JsonWebKeySet::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;
    use keywarden_types::{JsonWebKey, PublicJwk};

    fn location() -> JwksLocation {
        JwksLocation {
            bucket: "jwks-bucket".to_string(),
            object_key: ".well-known/jwks.json".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_without_document_is_empty() {
        let publisher = JwksPublisher::new(Arc::new(MemoryObjectStore::new()), location());
        assert!(publisher.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_writes_pretty_json_with_headers() {
        let store = Arc::new(MemoryObjectStore::new());
        let publisher = JwksPublisher::new(store.clone(), location());

        let jwks = JsonWebKeySet {
            keys: vec![JsonWebKey::signing(
                PublicJwk::Rsa {
                    n: "abc".to_string(),
                    e: "AQAB".to_string(),
                },
                "kid-1",
                "RS256",
            )],
        };
        publisher.publish(jwks.clone()).await.unwrap();

        let puts = store.puts().await;
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].key, ".well-known/jwks.json");
        assert_eq!(puts[0].content_type, "application/json");
        assert_eq!(puts[0].cache_control, "public, max-age=3600");

        let body = String::from_utf8(puts[0].body.clone()).unwrap();
        let expected = "{\n  \"keys\": [\n    {\n      \"kty\": \"RSA\",\n      \"n\": \"abc\",\n      \"e\": \"AQAB\",\n      \"kid\": \"kid-1\",\n      \"alg\": \"RS256\",\n      \"use\": \"sig\"\n    }\n  ]\n}";
        assert_eq!(body, expected);

        assert_eq!(publisher.load().await.unwrap(), jwks);
    }
}

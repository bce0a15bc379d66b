//! Object storage for the published JWKS document
//!
//! [`S3ObjectStore`] talks to S3 or any S3-compatible endpoint through
//! rusoto; [`MemoryObjectStore`] keeps objects in process and records every
//! put for tests.
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


use async_trait::async_trait;
use rusoto_core::credential::DefaultCredentialsProvider;
use rusoto_core::request::HttpClient;
use rusoto_core::{Region, RusotoError};
use rusoto_s3::{GetObjectError, GetObjectRequest, PutObjectRequest, S3Client, S3};
use std::collections::HashMap;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Object storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object store client error: {0}")]
    Client(String),

    #[error("Failed to read s3://{bucket}/{key}: {reason}")]
    Get {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Failed to write s3://{bucket}/{key}: {reason}")]
    Put {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("Invalid JWKS document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A single object write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPut {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
}

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an object body, `None` when the key does not exist
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Write an object, replacing any existing body
    async fn put_object(&self, put: ObjectPut) -> StorageResult<()>;
}

/// S3-compatible object store
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Create a store using the default AWS credential chain
    pub fn new(region: Region) -> StorageResult<Self> {
        let http_client = HttpClient::new()
            .map_err(|e| StorageError::Client(format!("Failed to create HTTP client: {}", e)))?;
        let credentials = DefaultCredentialsProvider::new().map_err(|e| {
            StorageError::Client(format!("Failed to create credentials provider: {}", e))
        })?;

        info!(region = region.name(), "Creating S3 client");

        Ok(Self::with_client(S3Client::new_with(
            http_client,
            credentials,
            region,
        )))
    }

    pub fn with_client(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let request = GetObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            ..Default::default()
        };

        let response = match self.client.get_object(request).await {
            Ok(response) => response,
            Err(RusotoError::Service(GetObjectError::NoSuchKey(_))) => {
                debug!(bucket = bucket, key = key, "Object not found");
                return Ok(None);
            }
            Err(RusotoError::Unknown(ref response)) if response.status.as_u16() == 404 => {
                debug!(bucket = bucket, key = key, "Object not found");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::Get {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let body = match response.body {
            Some(body) => body,
            None => return Ok(Some(Vec::new())),
        };

        let mut bytes = Vec::new();
        body.into_async_read()
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| StorageError::Get {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Some(bytes))
    }

    async fn put_object(&self, put: ObjectPut) -> StorageResult<()> {
        let bucket = put.bucket.clone();
        let key = put.key.clone();

        let request = PutObjectRequest {
            bucket: put.bucket,
            key: put.key,
            body: Some(put.body.into()),
            content_type: Some(put.content_type),
            cache_control: Some(put.cache_control),
            ..Default::default()
        };

        self.client
            .put_object(request)
            .await
            .map_err(|e| StorageError::Put {
                bucket,
                key,
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

/// In-memory object store
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    puts: RwLock<Vec<ObjectPut>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every put received so far, in order
    pub async fn puts(&self) -> Vec<ObjectPut> {
        self.puts.read().await.clone()
    }

    pub async fn put_count(&self) -> usize {
        self.puts.read().await.len()
    }

    pub async fn clear_puts(&self) {
        self.puts.write().await.clear();
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let objects = self.objects.read().await;
        Ok(objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }

    async fn put_object(&self, put: ObjectPut) -> StorageResult<()> {
        self.objects
            .write()
            .await
            .insert((put.bucket.clone(), put.key.clone()), put.body.clone());
        self.puts.write().await.push(put);
        Ok(())
    }
}

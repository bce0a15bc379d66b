//! AWS Secrets Manager backend
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


use crate::backend::{SecretBackend, SecretVersion};
use crate::error::{KeyError, KeyResult};
use crate::key_types::Stage;
use async_trait::async_trait;
use rusoto_core::credential::DefaultCredentialsProvider;
use rusoto_core::request::HttpClient;
use rusoto_core::{Region, RusotoError};
use rusoto_secretsmanager::{
    GetSecretValueError, GetSecretValueRequest, PutSecretValueRequest, SecretsManager,
    SecretsManagerClient, UpdateSecretVersionStageRequest,
};
use tracing::{debug, info};

/// Secrets Manager client speaking the [`SecretBackend`] protocol
pub struct SecretsManagerBackend {
    client: SecretsManagerClient,
}

impl SecretsManagerBackend {
    /// Create a backend using the default AWS credential chain
    pub fn new(region: Region) -> KeyResult<Self> {
        let http_client = HttpClient::new()
            .map_err(|e| KeyError::Backend(format!("Failed to create HTTP client: {}", e)))?;
        let credentials = DefaultCredentialsProvider::new().map_err(|e| {
            KeyError::Backend(format!("Failed to create credentials provider: {}", e))
        })?;

        info!(region = region.name(), "Creating Secrets Manager client");

        Ok(Self::with_client(SecretsManagerClient::new_with(
            http_client,
            credentials,
            region,
        )))
    }

    pub fn with_client(client: SecretsManagerClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretBackend for SecretsManagerBackend {
    async fn get_secret_value(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
        stage: Stage,
    ) -> KeyResult<Option<SecretVersion>> {
        let request = GetSecretValueRequest {
            secret_id: secret_id.to_string(),
            version_id: version_id.map(str::to_string),
            version_stage: Some(stage.label().to_string()),
        };

        match self.client.get_secret_value(request).await {
            Ok(response) => {
                let version_id = response.version_id.ok_or_else(|| {
                    KeyError::Backend(format!("GetSecretValue for {} returned no VersionId", secret_id))
                })?;
                let secret_string = response.secret_string.ok_or_else(|| {
                    KeyError::Backend(format!(
                        "GetSecretValue for {} returned no SecretString",
                        secret_id
                    ))
                })?;
                Ok(Some(SecretVersion {
                    version_id,
                    secret_string,
                }))
            }
            Err(RusotoError::Service(GetSecretValueError::ResourceNotFound(message))) => {
                debug!(
                    secret_id = %secret_id,
                    stage = %stage,
                    message = %message,
                    "Secret version not found"
                );
                Ok(None)
            }
            Err(e) => Err(KeyError::Backend(format!(
                "GetSecretValue failed for {} ({}): {}",
                secret_id, stage, e
            ))),
        }
    }

    async fn put_secret_value(
        &self,
        secret_id: &str,
        client_request_token: &str,
        secret_string: &str,
        stages: &[Stage],
    ) -> KeyResult<String> {
        let request = PutSecretValueRequest {
            secret_id: secret_id.to_string(),
            client_request_token: Some(client_request_token.to_string()),
            secret_string: Some(secret_string.to_string()),
            version_stages: Some(stages.iter().map(|s| s.label().to_string()).collect()),
            ..Default::default()
        };

        let response = self.client.put_secret_value(request).await.map_err(|e| {
            KeyError::Backend(format!("PutSecretValue failed for {}: {}", secret_id, e))
        })?;

        Ok(response
            .version_id
            .unwrap_or_else(|| client_request_token.to_string()))
    }

    async fn update_secret_version_stage(
        &self,
        secret_id: &str,
        stage: Stage,
        remove_from_version_id: &str,
        move_to_version_id: &str,
    ) -> KeyResult<()> {
        let request = UpdateSecretVersionStageRequest {
            secret_id: secret_id.to_string(),
            version_stage: stage.label().to_string(),
            remove_from_version_id: Some(remove_from_version_id.to_string()),
            move_to_version_id: Some(move_to_version_id.to_string()),
        };

        self.client
            .update_secret_version_stage(request)
            .await
            .map_err(|e| {
                KeyError::Backend(format!(
                    "UpdateSecretVersionStage failed for {} ({}): {}",
                    secret_id, stage, e
                ))
            })?;

        Ok(())
    }
}

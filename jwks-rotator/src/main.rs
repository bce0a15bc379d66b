//! JWKS Rotator
//!
//! Handles one trigger event per invocation:
//! - Reads the event JSON from the file named by the first argument, or stdin
//! - Runs the matching rotation step or cleanup
//! - Exits 0 when the step completed, 75 when it must be retried later, 1 on error
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


use anyhow::{Context, Result};
use jwks_rotator::aws::region_for;
use jwks_rotator::{
    JwksPublisher, RotationContext, RotationHandler, S3ObjectStore, StepOutcome, SystemClock,
};
use keywarden_config::RotatorConfig;
use keywarden_keys::init_key_store;
use keywarden_logging::{init_console_logging, init_logging};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

const SERVICE_NAME: &str = "jwks-rotator";

/// Exit status asking the scheduler to retry later (EX_TEMPFAIL)
const EXIT_RETRY_LATER: u8 = 75;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match RotatorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_console_logging(SERVICE_NAME, "info");
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    init_logging(SERVICE_NAME, config.log_level(), config.log_format);

    match run(config).await {
        Ok(StepOutcome::Completed) => ExitCode::SUCCESS,
        Ok(StepOutcome::AbortedPendingRetry(_)) => ExitCode::from(EXIT_RETRY_LATER),
        Err(e) => {
            error!(error = %format!("{:#}", e), "JWKS rotator failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: RotatorConfig) -> Result<StepOutcome> {
    info!(
        bucket = %config.jwks.bucket,
        key = %config.jwks.object_key,
        algorithm = %config.key_params().algorithm(),
        "Starting JWKS rotator"
    );

    let region = region_for(&config.aws).context("Failed to resolve AWS region")?;
    let key_store = init_key_store(region.clone()).context("Failed to initialize key store")?;
    let object_store =
        Arc::new(S3ObjectStore::new(region).context("Failed to initialize object storage")?);

    let context = RotationContext::new(
        key_store,
        JwksPublisher::new(object_store, config.jwks.clone()),
        Arc::new(SystemClock),
        config.policy,
        config.key_spec.clone(),
    );
    let handler = RotationHandler::new(Arc::new(context));

    let input = read_event().await?;
    let outcome = handler.handle_json(&input).await?;
    Ok(outcome)
}

async fn read_event() -> Result<String> {
    match std::env::args().nth(1) {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read event file {}", path)),
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read event from stdin")?;
            Ok(input)
        }
    }
}

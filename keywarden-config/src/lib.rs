//! Configuration management for the Keywarden rotator
//!
//! Values come from the process environment (after an optional `.env` file),
//! read through the `config` crate so tests can inject the same keys with
//! `set_override`. Every failure names the variable at fault.

use keywarden_types::{KeyParams, KeySpec};
use serde::Deserialize;
use thiserror::Error;

/// Default grace period kept on top of the token lifetime before a retired key
/// is dropped from the published JWKS (one hour).
pub const DEFAULT_MIN_KEY_CLEANUP_GRACE_PERIOD_SECONDS: u64 = 3600;

const JWKS_BUCKET_NAME: &str = "JWKS_BUCKET_NAME";
const JWKS_OBJECT_KEY: &str = "JWKS_OBJECT_KEY";
const MIN_ACTIVATION_GRACE_PERIOD_SECONDS: &str = "MIN_ACTIVATION_GRACE_PERIOD_SECONDS";
const MAX_TOKEN_VALIDITY_DURATION_SECONDS: &str = "MAX_TOKEN_VALIDITY_DURATION_SECONDS";
const MIN_KEY_CLEANUP_GRACE_PERIOD_SECONDS: &str = "MIN_KEY_CLEANUP_GRACE_PERIOD_SECONDS";
const KEY_SPEC: &str = "KEY_SPEC";
const AWS_REGION: &str = "AWS_REGION";
const AWS_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
const LOG_LEVEL: &str = "LOG_LEVEL";
const LOG_FORMAT: &str = "LOG_FORMAT";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Object storage location of the published JWKS document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JwksLocation {
    pub bucket: String,
    pub object_key: String,
}

/// AWS client settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    /// Custom endpoint for S3/Secrets Manager compatible services
    pub endpoint: Option<String>,
}

/// Grace periods and lifetimes driving the rotation policy, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RotationPolicy {
    pub min_activation_grace_period_seconds: u64,
    pub max_token_validity_duration_seconds: u64,
    pub min_key_cleanup_grace_period_seconds: u64,
}

impl RotationPolicy {
    /// How long after the current key's activation its predecessor stays published
    pub fn previous_key_retention_seconds(&self) -> u64 {
        self.max_token_validity_duration_seconds
            .saturating_add(self.min_key_cleanup_grace_period_seconds)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Console,
}

/// Rotator configuration
#[derive(Debug, Clone)]
pub struct RotatorConfig {
    pub jwks: JwksLocation,
    pub policy: RotationPolicy,
    pub key_spec: KeySpec,
    key_params: KeyParams,
    pub aws: AwsConfig,
    pub log_level: Option<String>,
    pub log_format: LogFormat,
}

impl RotatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let source = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        Self::from_source(&source)
    }

    /// Load configuration from an already-built source.
    ///
    /// Keys are the lowercase forms of the environment variable names.
    pub fn from_source(source: &config::Config) -> ConfigResult<Self> {
        let jwks = JwksLocation {
            bucket: required_string(source, JWKS_BUCKET_NAME)?,
            object_key: required_string(source, JWKS_OBJECT_KEY)?,
        };

        let policy = RotationPolicy {
            min_activation_grace_period_seconds: required_seconds(
                source,
                MIN_ACTIVATION_GRACE_PERIOD_SECONDS,
            )?,
            max_token_validity_duration_seconds: required_seconds(
                source,
                MAX_TOKEN_VALIDITY_DURATION_SECONDS,
            )?,
            min_key_cleanup_grace_period_seconds: optional_string(
                source,
                MIN_KEY_CLEANUP_GRACE_PERIOD_SECONDS,
            )?
            .map(|raw| parse_seconds(MIN_KEY_CLEANUP_GRACE_PERIOD_SECONDS, &raw))
            .transpose()?
            .unwrap_or(DEFAULT_MIN_KEY_CLEANUP_GRACE_PERIOD_SECONDS),
        };

        let (key_spec, key_params) = parse_key_spec(&required_string(source, KEY_SPEC)?)?;

        let log_format = match optional_string(source, LOG_FORMAT)? {
            None => LogFormat::Json,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "console" => LogFormat::Console,
                _ => {
                    return Err(ConfigError::Invalid {
                        field: LOG_FORMAT,
                        reason: format!("expected 'json' or 'console', got '{}'", raw),
                    })
                }
            },
        };

        Ok(Self {
            jwks,
            policy,
            key_spec,
            key_params,
            aws: AwsConfig {
                region: optional_string(source, AWS_REGION)?,
                endpoint: optional_string(source, AWS_ENDPOINT_URL)?,
            },
            log_level: optional_string(source, LOG_LEVEL)?,
            log_format,
        })
    }

    /// Get log level, defaulting to "info"
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Validated key generation parameters
    pub fn key_params(&self) -> KeyParams {
        self.key_params
    }
}

fn source_key(field: &str) -> String {
    field.to_ascii_lowercase()
}

fn optional_string(source: &config::Config, field: &'static str) -> ConfigResult<Option<String>> {
    match source.get_string(&source_key(field)) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ConfigError::Invalid {
            field,
            reason: e.to_string(),
        }),
    }
}

fn required_string(source: &config::Config, field: &'static str) -> ConfigResult<String> {
    optional_string(source, field)?.ok_or(ConfigError::Missing(field))
}

fn required_seconds(source: &config::Config, field: &'static str) -> ConfigResult<u64> {
    let raw = required_string(source, field)?;
    parse_seconds(field, &raw)
}

fn parse_seconds(field: &'static str, raw: &str) -> ConfigResult<u64> {
    raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
        field,
        reason: format!("expected a non-negative number of seconds, got '{}'", raw),
    })
}

fn parse_key_spec(raw: &str) -> ConfigResult<(KeySpec, KeyParams)> {
    let spec: KeySpec = serde_json::from_str(raw).map_err(|e| ConfigError::Invalid {
        field: KEY_SPEC,
        reason: format!("malformed JSON key spec: {}", e),
    })?;
    let params = spec.resolve().map_err(|e| ConfigError::Invalid {
        field: KEY_SPEC,
        reason: e.to_string(),
    })?;
    Ok((spec, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keywarden_types::KeyAlgorithm;

    fn source(pairs: &[(&str, &str)]) -> config::Config {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(key.to_ascii_lowercase(), *value).unwrap();
        }
        builder.build().unwrap()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            ("JWKS_BUCKET_NAME", "auth-public"),
            ("JWKS_OBJECT_KEY", ".well-known/jwks.json"),
            ("MIN_ACTIVATION_GRACE_PERIOD_SECONDS", "86400"),
            ("MAX_TOKEN_VALIDITY_DURATION_SECONDS", "3600"),
            ("KEY_SPEC", r#"{"algorithm":"ES256"}"#),
        ]
    }

    #[test]
    fn test_config_loads_complete_source() {
        let config = RotatorConfig::from_source(&source(&complete())).unwrap();

        assert_eq!(config.jwks.bucket, "auth-public");
        assert_eq!(config.jwks.object_key, ".well-known/jwks.json");
        assert_eq!(config.policy.min_activation_grace_period_seconds, 86400);
        assert_eq!(config.policy.max_token_validity_duration_seconds, 3600);
        assert_eq!(
            config.policy.min_key_cleanup_grace_period_seconds,
            DEFAULT_MIN_KEY_CLEANUP_GRACE_PERIOD_SECONDS
        );
        assert_eq!(config.policy.previous_key_retention_seconds(), 7200);
        assert_eq!(config.key_params().algorithm(), KeyAlgorithm::ES256);
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.aws, AwsConfig::default());
    }

    #[test]
    fn test_config_reports_each_missing_field() {
        for (missing, _) in complete() {
            let pairs: Vec<_> = complete().into_iter().filter(|(k, _)| *k != missing).collect();
            let err = RotatorConfig::from_source(&source(&pairs)).unwrap_err();
            assert_eq!(err.to_string(), format!("Missing required configuration: {}", missing));
        }
    }

    #[test]
    fn test_config_rejects_malformed_seconds() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != "MAX_TOKEN_VALIDITY_DURATION_SECONDS");
        pairs.push(("MAX_TOKEN_VALIDITY_DURATION_SECONDS", "one hour"));

        let err = RotatorConfig::from_source(&source(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "MAX_TOKEN_VALIDITY_DURATION_SECONDS", .. }
        ));
    }

    #[test]
    fn test_config_rejects_unsupported_key_spec() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != "KEY_SPEC");
        pairs.push(("KEY_SPEC", r#"{"algorithm":"EdDSA"}"#));

        let err = RotatorConfig::from_source(&source(&pairs)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("KEY_SPEC"));
        assert!(message.contains("Unsupported algorithm: EdDSA"));
    }

    #[test]
    fn test_config_rejects_oversized_rsa_modulus() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != "KEY_SPEC");
        pairs.push(("KEY_SPEC", r#"{"algorithm":"RS256","modulusLength":8192}"#));

        let err = RotatorConfig::from_source(&source(&pairs)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("KEY_SPEC"));
        assert!(message.contains("at most 4096"));
    }

    #[test]
    fn test_config_rejects_malformed_key_spec_json() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != "KEY_SPEC");
        pairs.push(("KEY_SPEC", "RS256"));

        let err = RotatorConfig::from_source(&source(&pairs)).unwrap_err();
        assert!(err.to_string().contains("malformed JSON key spec"));
    }

    #[test]
    fn test_config_optional_overrides() {
        let mut pairs = complete();
        pairs.push(("MIN_KEY_CLEANUP_GRACE_PERIOD_SECONDS", "600"));
        pairs.push(("LOG_FORMAT", "console"));
        pairs.push(("LOG_LEVEL", "debug"));
        pairs.push(("AWS_REGION", "eu-west-1"));
        pairs.push(("AWS_ENDPOINT_URL", "http://localhost:4566"));

        let config = RotatorConfig::from_source(&source(&pairs)).unwrap();
        assert_eq!(config.policy.min_key_cleanup_grace_period_seconds, 600);
        assert_eq!(config.log_format, LogFormat::Console);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.aws.endpoint.as_deref(), Some("http://localhost:4566"));
    }
}

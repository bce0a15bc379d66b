//! Probe tokens used to prove a pending key against the published JWKS
//!
//! A short-lived token is signed with the pending private key and then
//! verified the way a relying party would: look the `kid` up in the JWKS and
//! check the signature with the published public parameters.
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


use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keywarden_keys::KeyRecord;
use keywarden_types::{JsonWebKeySet, KeyAlgorithm, PublicJwk};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of a probe token
pub const PROBE_TOKEN_TTL_SECONDS: i64 = 60;

pub const PROBE_SUBJECT: &str = "jwks-rotator-probe";

/// Claims carried by a probe token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token signing and verification errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token header carries no kid")]
    MissingKid,

    #[error("no applicable key found for kid {0}")]
    NoApplicableKey(String),

    #[error("Token expired at {0}")]
    Expired(i64),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

fn jwt_algorithm(alg: &str) -> Result<Algorithm, TokenError> {
    let algorithm: KeyAlgorithm = alg
        .parse()
        .map_err(|_| TokenError::UnsupportedAlgorithm(alg.to_string()))?;

    Ok(match algorithm {
        KeyAlgorithm::RS256 => Algorithm::RS256,
        KeyAlgorithm::RS384 => Algorithm::RS384,
        KeyAlgorithm::RS512 => Algorithm::RS512,
        KeyAlgorithm::PS256 => Algorithm::PS256,
        KeyAlgorithm::PS384 => Algorithm::PS384,
        KeyAlgorithm::PS512 => Algorithm::PS512,
        KeyAlgorithm::ES256 => Algorithm::ES256,
        KeyAlgorithm::ES384 => Algorithm::ES384,
    })
}

/// Sign a probe token valid for [`PROBE_TOKEN_TTL_SECONDS`] from `now`
pub fn sign_probe_token(record: &KeyRecord, now: DateTime<Utc>) -> Result<String, TokenError> {
    let algorithm = jwt_algorithm(&record.alg)?;

    let encoding_key = match record.public_jwk {
        PublicJwk::Rsa { .. } => EncodingKey::from_rsa_pem(record.private_key.as_bytes())?,
        PublicJwk::Ec { .. } => EncodingKey::from_ec_pem(record.private_key.as_bytes())?,
    };

    let mut header = Header::new(algorithm);
    header.kid = Some(record.kid.clone());

    let claims = ProbeClaims {
        sub: PROBE_SUBJECT.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: now.timestamp() + PROBE_TOKEN_TTL_SECONDS,
    };

    Ok(jsonwebtoken::encode(&header, &claims, &encoding_key)?)
}

/// Verify a token against the key its `kid` names in `jwks`
///
/// Expiry is checked against `now` rather than the wall clock.
pub fn verify_with_jwks(
    token: &str,
    jwks: &JsonWebKeySet,
    now: DateTime<Utc>,
) -> Result<ProbeClaims, TokenError> {
    let header = jsonwebtoken::decode_header(token)?;
    let kid = header.kid.ok_or(TokenError::MissingKid)?;

    let jwk = jwks
        .find(&kid)
        .ok_or_else(|| TokenError::NoApplicableKey(kid.clone()))?;

    let algorithm = jwt_algorithm(&jwk.alg)?;
    let decoding_key = match &jwk.key {
        PublicJwk::Rsa { n, e } => DecodingKey::from_rsa_components(n, e)?,
        PublicJwk::Ec { x, y, .. } => DecodingKey::from_ec_components(x, y)?,
    };

    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;

    let data = jsonwebtoken::decode::<ProbeClaims>(token, &decoding_key, &validation)?;
    if data.claims.exp < now.timestamp() {
        return Err(TokenError::Expired(data.claims.exp));
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use keywarden_types::KeySpec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn es256_key() -> KeyRecord {
        keywarden_keys::generate_at(&KeySpec::ec(KeyAlgorithm::ES256), now()).unwrap()
    }

    #[test]
    fn test_round_trip_against_jwks() {
        let key = es256_key();
        let jwks = JsonWebKeySet {
            keys: vec![key.to_jwk()],
        };

        let token = sign_probe_token(&key, now()).unwrap();
        let claims = verify_with_jwks(&token, &jwks, now()).unwrap();

        assert_eq!(claims.sub, PROBE_SUBJECT);
        assert_eq!(claims.exp - claims.iat, PROBE_TOKEN_TTL_SECONDS);
    }

    #[test]
    fn test_missing_kid_has_no_applicable_key() {
        let key = es256_key();
        let other = es256_key();
        let jwks = JsonWebKeySet {
            keys: vec![other.to_jwk()],
        };

        let token = sign_probe_token(&key, now()).unwrap();
        let err = verify_with_jwks(&token, &jwks, now()).unwrap_err();

        assert!(matches!(err, TokenError::NoApplicableKey(ref kid) if *kid == key.kid));
        assert!(err.to_string().contains("no applicable key found"));
    }

    #[test]
    fn test_wrong_key_under_same_kid_fails_signature() {
        let key = es256_key();
        let mut impostor = es256_key().to_jwk();
        impostor.kid = key.kid.clone();
        let jwks = JsonWebKeySet {
            keys: vec![impostor],
        };

        let token = sign_probe_token(&key, now()).unwrap();
        let err = verify_with_jwks(&token, &jwks, now()).unwrap_err();
        assert!(matches!(err, TokenError::Jwt(_)));
    }

    #[test]
    fn test_expiry_uses_supplied_time() {
        let key = es256_key();
        let jwks = JsonWebKeySet {
            keys: vec![key.to_jwk()],
        };
        let token = sign_probe_token(&key, now()).unwrap();

        let later = now() + Duration::seconds(PROBE_TOKEN_TTL_SECONDS + 1);
        let err = verify_with_jwks(&token, &jwks, later).unwrap_err();
        assert!(matches!(err, TokenError::Expired(_)));
    }
}

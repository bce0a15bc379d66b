//! Signing key generation
//!
//! RSA keys are written as PKCS#1 PEM, EC keys as PKCS#8 PEM; both forms load
//! directly into a JWT encoding key. The public half is emitted as JWK
//! parameters with unpadded base64url integers.
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


use crate::error::{KeyError, KeyResult};
use crate::key_types::KeyRecord;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use keywarden_types::{EcCurve, KeyParams, KeySpec, PublicJwk};
use rand::rngs::OsRng;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::LineEnding;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use tracing::debug;
use uuid::Uuid;

/// Generate a fresh key record stamped with the current time
pub fn generate(spec: &KeySpec) -> KeyResult<KeyRecord> {
    generate_at(spec, Utc::now())
}

/// Generate a fresh key record stamped with `created_at`
///
/// The spec is validated before any key work happens. The record has a new
/// random `kid` and no `activatedAt`.
pub fn generate_at(spec: &KeySpec, created_at: DateTime<Utc>) -> KeyResult<KeyRecord> {
    let params = spec.resolve()?;

    let (private_key, public_jwk) = match params {
        KeyParams::Rsa { modulus_length, .. } => generate_rsa(modulus_length)?,
        KeyParams::Ec {
            curve: EcCurve::P256,
            ..
        } => generate_p256()?,
        KeyParams::Ec {
            curve: EcCurve::P384,
            ..
        } => generate_p384()?,
    };

    let kid = Uuid::new_v4().to_string();
    debug!(kid = %kid, alg = %params.algorithm(), "Generated signing key");

    Ok(KeyRecord {
        private_key,
        public_jwk,
        kid,
        alg: params.algorithm().as_str().to_string(),
        created_at,
        activated_at: None,
    })
}

fn generate_rsa(modulus_length: u32) -> KeyResult<(String, PublicJwk)> {
    let key = RsaPrivateKey::new(&mut OsRng, modulus_length as usize)
        .map_err(|e| KeyError::Generation(format!("RSA key generation failed: {}", e)))?;

    let pem = key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation(format!("RSA key encoding failed: {}", e)))?;

    let jwk = PublicJwk::Rsa {
        n: URL_SAFE_NO_PAD.encode(key.n().to_bytes_be()),
        e: URL_SAFE_NO_PAD.encode(key.e().to_bytes_be()),
    };

    Ok((pem.as_str().to_owned(), jwk))
}

fn generate_p256() -> KeyResult<(String, PublicJwk)> {
    use p256::elliptic_curve::sec1::ToEncodedPoint;
    use p256::pkcs8::EncodePrivateKey;

    let secret = p256::SecretKey::random(&mut OsRng);
    let pem = secret
        .to_pkcs8_pem(p256::pkcs8::LineEnding::LF)
        .map_err(|e| KeyError::Generation(format!("P-256 key encoding failed: {}", e)))?;

    let point = secret.public_key().to_encoded_point(false);
    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(KeyError::Generation(
                "P-256 public point has no affine coordinates".to_string(),
            ))
        }
    };

    let jwk = PublicJwk::Ec {
        crv: EcCurve::P256.as_str().to_string(),
        x: URL_SAFE_NO_PAD.encode(x),
        y: URL_SAFE_NO_PAD.encode(y),
    };

    Ok((pem.as_str().to_owned(), jwk))
}

fn generate_p384() -> KeyResult<(String, PublicJwk)> {
    use p384::elliptic_curve::sec1::ToEncodedPoint;
    use p384::pkcs8::EncodePrivateKey;

    let secret = p384::SecretKey::random(&mut OsRng);
    let pem = secret
        .to_pkcs8_pem(p384::pkcs8::LineEnding::LF)
        .map_err(|e| KeyError::Generation(format!("P-384 key encoding failed: {}", e)))?;

    let point = secret.public_key().to_encoded_point(false);
    let (x, y) = match (point.x(), point.y()) {
        (Some(x), Some(y)) => (x, y),
        _ => {
            return Err(KeyError::Generation(
                "P-384 public point has no affine coordinates".to_string(),
            ))
        }
    };

    let jwk = PublicJwk::Ec {
        crv: EcCurve::P384.as_str().to_string(),
        x: URL_SAFE_NO_PAD.encode(x),
        y: URL_SAFE_NO_PAD.encode(y),
    };

    Ok((pem.as_str().to_owned(), jwk))
}

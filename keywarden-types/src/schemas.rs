//! Key specification and JWKS document schemas
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


use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TypesError};

// ============================================================================
// Key specification
// ============================================================================

/// Default RSA modulus length when the key spec does not name one
pub const DEFAULT_MODULUS_LENGTH: u32 = 2048;

/// Smallest RSA modulus length accepted for signing keys
pub const MIN_MODULUS_LENGTH: u32 = 2048;

/// Largest RSA modulus length the JWT signer accepts
pub const MAX_MODULUS_LENGTH: u32 = 4096;

/// Key family an algorithm belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Rsa,
    Ec,
}

/// Elliptic curves available to the EC family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
}

impl EcCurve {
    /// JWK `crv` name
    pub fn as_str(&self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::P384 => "P-384",
        }
    }
}

/// JWS signing algorithms keys can be generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    RS256,
    RS384,
    RS512,
    PS256,
    PS384,
    PS512,
    ES256,
    ES384,
}

impl KeyAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlgorithm::RS256 => "RS256",
            KeyAlgorithm::RS384 => "RS384",
            KeyAlgorithm::RS512 => "RS512",
            KeyAlgorithm::PS256 => "PS256",
            KeyAlgorithm::PS384 => "PS384",
            KeyAlgorithm::PS512 => "PS512",
            KeyAlgorithm::ES256 => "ES256",
            KeyAlgorithm::ES384 => "ES384",
        }
    }

    pub fn family(&self) -> KeyFamily {
        match self {
            KeyAlgorithm::ES256 | KeyAlgorithm::ES384 => KeyFamily::Ec,
            _ => KeyFamily::Rsa,
        }
    }

    /// Curve fixed by an ECDSA algorithm, `None` for the RSA family
    pub fn curve(&self) -> Option<EcCurve> {
        match self {
            KeyAlgorithm::ES256 => Some(EcCurve::P256),
            KeyAlgorithm::ES384 => Some(EcCurve::P384),
            _ => None,
        }
    }
}

impl FromStr for KeyAlgorithm {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RS256" => Ok(KeyAlgorithm::RS256),
            "RS384" => Ok(KeyAlgorithm::RS384),
            "RS512" => Ok(KeyAlgorithm::RS512),
            "PS256" => Ok(KeyAlgorithm::PS256),
            "PS384" => Ok(KeyAlgorithm::PS384),
            "PS512" => Ok(KeyAlgorithm::PS512),
            "ES256" => Ok(KeyAlgorithm::ES256),
            "ES384" => Ok(KeyAlgorithm::ES384),
            "ES512" => Err(TypesError::UnsupportedAlgorithm(
                "ES512 (P-521 signing is not available in the JWT signer)".to_string(),
            )),
            other => Err(TypesError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key generation parameters, as configured
///
/// ```json
/// {"algorithm": "RS256", "modulusLength": 3072}
/// {"algorithm": "ES256", "namedCurve": "P-256"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeySpec {
    pub algorithm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modulus_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_curve: Option<String>,
}

/// A key spec whose algorithm and parameters have been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyParams {
    Rsa {
        algorithm: KeyAlgorithm,
        modulus_length: u32,
    },
    Ec {
        algorithm: KeyAlgorithm,
        curve: EcCurve,
    },
}

impl KeyParams {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyParams::Rsa { algorithm, .. } | KeyParams::Ec { algorithm, .. } => *algorithm,
        }
    }
}

impl KeySpec {
    pub fn rsa(algorithm: KeyAlgorithm, modulus_length: u32) -> Self {
        Self {
            algorithm: algorithm.as_str().to_string(),
            modulus_length: Some(modulus_length),
            named_curve: None,
        }
    }

    pub fn ec(algorithm: KeyAlgorithm) -> Self {
        Self {
            algorithm: algorithm.as_str().to_string(),
            modulus_length: None,
            named_curve: algorithm.curve().map(|c| c.as_str().to_string()),
        }
    }

    /// Check the algorithm and family parameters without doing any key work
    pub fn resolve(&self) -> Result<KeyParams> {
        let algorithm: KeyAlgorithm = self.algorithm.parse()?;

        match algorithm.curve() {
            None => {
                if self.named_curve.is_some() {
                    return Err(TypesError::InvalidKeySpec(format!(
                        "namedCurve is not applicable to {}",
                        algorithm
                    )));
                }
                let modulus_length = self.modulus_length.unwrap_or(DEFAULT_MODULUS_LENGTH);
                if modulus_length < MIN_MODULUS_LENGTH {
                    return Err(TypesError::InvalidKeySpec(format!(
                        "modulusLength must be at least {} bits, got {}",
                        MIN_MODULUS_LENGTH, modulus_length
                    )));
                }
                if modulus_length > MAX_MODULUS_LENGTH {
                    return Err(TypesError::InvalidKeySpec(format!(
                        "modulusLength must be at most {} bits, got {}",
                        MAX_MODULUS_LENGTH, modulus_length
                    )));
                }
                Ok(KeyParams::Rsa {
                    algorithm,
                    modulus_length,
                })
            }
            Some(curve) => {
                if self.modulus_length.is_some() {
                    return Err(TypesError::InvalidKeySpec(format!(
                        "modulusLength is not applicable to {}",
                        algorithm
                    )));
                }
                if let Some(ref named) = self.named_curve {
                    if named != curve.as_str() {
                        return Err(TypesError::InvalidKeySpec(format!(
                            "{} requires namedCurve {}, got {}",
                            algorithm,
                            curve.as_str(),
                            named
                        )));
                    }
                }
                Ok(KeyParams::Ec { algorithm, curve })
            }
        }
    }
}

// ============================================================================
// JWKS document
// ============================================================================

/// `use` value for signature keys
pub const KEY_USE_SIG: &str = "sig";

/// Public half of a signing key in JWK form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kty")]
pub enum PublicJwk {
    #[serde(rename = "RSA")]
    Rsa { n: String, e: String },
    #[serde(rename = "EC")]
    Ec { crv: String, x: String, y: String },
}

/// A single published JSON Web Key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    #[serde(flatten)]
    pub key: PublicJwk,
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
}

impl JsonWebKey {
    pub fn signing(key: PublicJwk, kid: impl Into<String>, alg: impl Into<String>) -> Self {
        Self {
            key,
            kid: kid.into(),
            alg: alg.into(),
            key_use: KEY_USE_SIG.to_string(),
        }
    }
}

/// JSON Web Key Set, the published artifact verifiers consume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Look up a key by `kid`
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    pub fn kids(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.kid.as_str()).collect()
    }
}

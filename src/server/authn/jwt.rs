use std::collections::HashMap;

use anyhow::{bail, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::{Account, InspectError, Inspector};

/// Claims carried by account tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Required. Account id
    pub iss: String, // Required. Issuing namespace
    pub exp: usize,  // Required. Token expiration time (timestamp)
    pub iat: usize,  // Required. Time at which token was issued (timestamp)

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<usize>,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Inspects JSON Web Tokens signed either with a shared HS256 secret or with
/// an RSA key (RS256).
pub struct JwtInspector {
    key: DecodingKey,
    algorithm: Algorithm,
    leeway: u64,
}

impl JwtInspector {
    pub fn with_secret(secret: &[u8], leeway: u64) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            leeway,
        }
    }

    /// # Arguments
    /// * `public_key` - RSA public key in PEM format
    /// * `leeway` - Allowed clock skew in seconds
    pub fn with_rsa_pem(public_key: &[u8], leeway: u64) -> Result<Self> {
        let key = match DecodingKey::from_rsa_pem(public_key) {
            Ok(key) => key,
            Err(e) => bail!("parse RSA public key for jwt inspection failed: {e}"),
        };
        Ok(Self {
            key,
            algorithm: Algorithm::RS256,
            leeway,
        })
    }
}

impl Inspector for JwtInspector {
    fn inspect(&self, token: &str) -> Result<Account, InspectError> {
        if token.is_empty() {
            return Err(InspectError::EmptyToken);
        }

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

        let claims = match decode::<Claims>(token, &self.key, &validation) {
            Ok(data) => data.claims,
            Err(e) => return Err(InspectError::InvalidToken(e.to_string())),
        };

        if claims.sub.is_empty() {
            return Err(InspectError::InvalidToken(String::from("empty subject")));
        }
        if claims.iss.is_empty() {
            return Err(InspectError::InvalidToken(String::from("empty issuer")));
        }

        Ok(Account {
            id: claims.sub,
            issuer: claims.iss,
            scopes: claims.scopes,
            metadata: claims.metadata,
        })
    }
}

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthnConfig {
    /// Name of the session cookie holding the account token, used when the
    /// request has no `Authorization` header.
    #[serde(default = "AuthnConfig::default_token_cookie")]
    pub token_cookie: String,

    /// Shared secret for HS256 signed tokens. Supports env expansion, e.g.
    /// `$GATE_JWT_SECRET`.
    #[serde(default = "AuthnConfig::default_jwt_secret")]
    pub jwt_secret: String,

    /// RSA public key (PEM format) for RS256 signed tokens.
    #[serde(default = "AuthnConfig::default_public_key_path")]
    pub public_key_path: String,

    /// Allowed clock skew in seconds when checking token times.
    #[serde(default = "AuthnConfig::default_leeway_secs")]
    pub leeway_secs: u64,
}

impl CommonConfig for AuthnConfig {
    fn default() -> Self {
        Self {
            token_cookie: Self::default_token_cookie(),
            jwt_secret: Self::default_jwt_secret(),
            public_key_path: Self::default_public_key_path(),
            leeway_secs: Self::default_leeway_secs(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        if self.token_cookie.is_empty() {
            bail!("token_cookie cannot be empty");
        }
        if self
            .token_cookie
            .chars()
            .any(|c| !c.is_ascii_graphic() || "=;,".contains(c))
        {
            bail!("invalid token_cookie name '{}'", self.token_cookie);
        }

        self.jwt_secret = expandenv("jwt_secret", &self.jwt_secret)?;
        self.public_key_path = expandenv("public_key_path", &self.public_key_path)?;

        match (self.jwt_secret.is_empty(), self.public_key_path.is_empty()) {
            (true, true) => bail!("one of jwt_secret or public_key_path is required"),
            (false, false) => bail!("jwt_secret and public_key_path cannot both be set"),
            _ => {}
        }

        if !self.jwt_secret.is_empty() && self.jwt_secret.len() < Self::MIN_SECRET_LENGTH {
            bail!(
                "jwt_secret must be at least {} bytes",
                Self::MIN_SECRET_LENGTH
            );
        }

        if self.leeway_secs > Self::MAX_LEEWAY_SECS {
            bail!(
                "leeway_secs must be less than or equal to {}",
                Self::MAX_LEEWAY_SECS
            );
        }

        Ok(())
    }
}

impl AuthnConfig {
    const MIN_SECRET_LENGTH: usize = 16;
    const MAX_LEEWAY_SECS: u64 = 300;

    pub fn default_token_cookie() -> String {
        String::from("micro-token")
    }

    pub fn default_jwt_secret() -> String {
        String::new()
    }

    pub fn default_public_key_path() -> String {
        String::new()
    }

    pub fn default_leeway_secs() -> u64 {
        30
    }
}

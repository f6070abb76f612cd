use std::fs;

use anyhow::{Context, Result};
use log::info;

use super::config::AuthnConfig;
use super::jwt::JwtInspector;

/// Builds the token inspector from configuration.
pub struct AuthnFactory;

impl AuthnFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build_inspector(&self, cfg: &AuthnConfig) -> Result<JwtInspector> {
        if !cfg.jwt_secret.is_empty() {
            info!("Inspecting tokens with HS256 shared secret");
            return Ok(JwtInspector::with_secret(
                cfg.jwt_secret.as_bytes(),
                cfg.leeway_secs,
            ));
        }

        info!(
            "Inspecting tokens with RS256 public key {}",
            cfg.public_key_path
        );
        let public_key = fs::read(&cfg.public_key_path)
            .with_context(|| format!("read token public key: {}", cfg.public_key_path))?;
        JwtInspector::with_rsa_pem(&public_key, cfg.leeway_secs)
    }
}

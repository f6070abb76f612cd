use log::{info, warn};

use super::config::AuthzConfig;
use super::rule::RuleVerifier;

pub struct AuthzFactory;

impl AuthzFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build_verifier(&self, cfg: &AuthzConfig) -> RuleVerifier {
        if cfg.rules.is_empty() {
            warn!("No authz rule configured, every request will be forbidden");
        } else {
            info!("Loaded {} authz rules", cfg.rules.len());
        }
        RuleVerifier::new(cfg.rules.clone())
    }
}

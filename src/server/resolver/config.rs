use anyhow::{bail, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

use super::is_valid_service_name;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolverConfig {
    /// How request paths map to endpoints. `rpc` fills the RPC method
    /// (`/users/read` -> `Users.Read`), `http` only keeps the HTTP method.
    #[serde(default = "ResolverKind::default")]
    pub kind: ResolverKind,

    /// Domain (namespace) stamped on every resolved endpoint.
    #[serde(default = "ResolverConfig::default_domain")]
    pub domain: String,

    /// Known services. When empty, every well formed service name routes.
    #[serde(default = "ResolverConfig::default_services")]
    pub services: Vec<String>,

    /// Derive the domain from the request host.
    #[serde(default = "ResolverConfig::default_subdomain")]
    pub subdomain: bool,

    /// Host suffixes the subdomain resolver strips, e.g. `example.com`.
    #[serde(default = "ResolverConfig::default_base_domains")]
    pub base_domains: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolverKind {
    #[serde(rename = "rpc")]
    #[default]
    Rpc,

    #[serde(rename = "http")]
    Http,
}

impl CommonConfig for ResolverConfig {
    fn default() -> Self {
        Self {
            kind: ResolverKind::default(),
            domain: Self::default_domain(),
            services: Self::default_services(),
            subdomain: Self::default_subdomain(),
            base_domains: Self::default_base_domains(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        if !self.domain.chars().all(|c| c.is_ascii_graphic()) {
            bail!("domain '{}' contains invalid characters", self.domain);
        }

        for service in self.services.iter() {
            if !is_valid_service_name(service) {
                bail!("invalid service name '{service}'");
            }
        }

        self.base_domains = self
            .base_domains
            .iter()
            .map(|base| base.trim_matches('.').to_lowercase())
            .collect();
        if self.base_domains.iter().any(|base| base.is_empty()) {
            bail!("base_domains cannot contain empty domain");
        }

        if self.subdomain && self.base_domains.is_empty() {
            warn!("Subdomain resolver enabled without base_domains, no domain will be derived from hosts");
        }

        Ok(())
    }
}

impl ResolverConfig {
    pub fn default_domain() -> String {
        String::from("micro")
    }

    pub fn default_services() -> Vec<String> {
        vec![]
    }

    pub fn default_subdomain() -> bool {
        false
    }

    pub fn default_base_domains() -> Vec<String> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_complete() {
        let ps = PathSet::new_test(Path::new("/tmp/micro-gate"));

        let mut cfg = ResolverConfig::default();
        cfg.base_domains = vec![String::from(".Example.COM.")];
        cfg.complete(&ps).unwrap();
        assert_eq!(cfg.base_domains, vec![String::from("example.com")]);

        let mut cfg = ResolverConfig::default();
        cfg.domain = String::from("bad domain");
        assert!(cfg.complete(&ps).is_err());

        let mut cfg = ResolverConfig::default();
        cfg.services = vec![String::from("users"), String::from("no/slash")];
        assert!(cfg.complete(&ps).is_err());

        let mut cfg = ResolverConfig::default();
        cfg.base_domains = vec![String::from("..")];
        assert!(cfg.complete(&ps).is_err());
    }
}

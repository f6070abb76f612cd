use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, is_http_url, CommonConfig, PathSet};
use crate::logs::LogsConfig;

use super::authn::config::AuthnConfig;
use super::authz::config::AuthzConfig;
use super::blocklist::config::BlocklistConfig;
use super::resolver::config::ResolverConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GateConfig {
    #[serde(default = "GateConfig::default_bind")]
    pub bind: String,

    #[serde(default = "GateConfig::default_ssl")]
    pub ssl: bool,

    #[serde(default = "GateConfig::default_cert_path")]
    pub cert_path: String,

    #[serde(default = "GateConfig::default_key_path")]
    pub key_path: String,

    #[serde(default = "GateConfig::default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    #[serde(default = "GateConfig::default_workers")]
    pub workers: u64,

    #[serde(default = "GateConfig::default_payload_limit_mib")]
    pub payload_limit_mib: usize,

    /// Base URL allowed requests are forwarded to.
    #[serde(default = "GateConfig::default_upstream")]
    pub upstream: String,

    /// Where anonymous callers are sent when they are refused. Either a path
    /// (`/login`) or an absolute URL. Empty answers 401 instead.
    #[serde(default = "GateConfig::default_login_url")]
    pub login_url: String,

    /// Prepended to service names in authz resources, e.g. `go.micro.api`.
    #[serde(default = "GateConfig::default_service_prefix")]
    pub service_prefix: String,

    #[serde(default = "LogsConfig::default")]
    pub logs: LogsConfig,

    #[serde(default = "ResolverConfig::default")]
    pub resolver: ResolverConfig,

    #[serde(default = "AuthnConfig::default")]
    pub authn: AuthnConfig,

    #[serde(default = "AuthzConfig::default")]
    pub authz: AuthzConfig,

    #[serde(default = "BlocklistConfig::default")]
    pub blocklist: BlocklistConfig,
}

impl CommonConfig for GateConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            ssl: Self::default_ssl(),
            cert_path: Self::default_cert_path(),
            key_path: Self::default_key_path(),
            keep_alive_secs: Self::default_keep_alive_secs(),
            workers: Self::default_workers(),
            payload_limit_mib: Self::default_payload_limit_mib(),
            upstream: Self::default_upstream(),
            login_url: Self::default_login_url(),
            service_prefix: Self::default_service_prefix(),
            logs: LogsConfig::default(),
            resolver: ResolverConfig::default(),
            authn: AuthnConfig::default(),
            authz: AuthzConfig::default(),
            blocklist: BlocklistConfig::default(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.bind = expandenv("bind", &self.bind)?;
        if self.bind.is_empty() {
            bail!("bind cannot be empty");
        }

        if self.ssl {
            self.cert_path = expandenv("cert_path", &self.cert_path)?;
            if self.cert_path.is_empty() {
                let path = ps.pki_path.join("server.crt");
                self.cert_path = format!("{}", path.display());
            }

            self.key_path = expandenv("key_path", &self.key_path)?;
            if self.key_path.is_empty() {
                let path = ps.pki_path.join("server.key");
                self.key_path = format!("{}", path.display());
            }
        }

        if self.payload_limit_mib < Self::MIN_PAYLOAD_LIMIT_MIB {
            bail!(
                "payload_limit_mib must be greater than or equal to {}",
                Self::MIN_PAYLOAD_LIMIT_MIB
            );
        }
        if self.payload_limit_mib > Self::MAX_PAYLOAD_LIMIT_MIB {
            bail!(
                "payload_limit_mib must be less than or equal to {}",
                Self::MAX_PAYLOAD_LIMIT_MIB
            );
        }

        self.upstream = expandenv("upstream", &self.upstream)?;
        if !is_http_url(&self.upstream) {
            bail!(
                "upstream must be an http(s) url, found '{}'",
                self.upstream
            );
        }
        if url::Url::parse(&self.upstream).is_err() {
            bail!("invalid upstream url '{}'", self.upstream);
        }

        self.login_url = expandenv("login_url", &self.login_url)?;
        if !self.login_url.is_empty() {
            if is_http_url(&self.login_url) {
                if url::Url::parse(&self.login_url).is_err() {
                    bail!("invalid login_url '{}'", self.login_url);
                }
            } else if !self.login_url.starts_with('/') {
                bail!(
                    "login_url must be a path starting with '/' or an http(s) url, found '{}'",
                    self.login_url
                );
            }
        }

        self.service_prefix = self.service_prefix.trim_end_matches('.').to_string();

        self.logs.complete(ps).context("logs")?;
        self.resolver.complete(ps).context("resolver")?;
        self.authn.complete(ps).context("authn")?;
        self.authz.complete(ps).context("authz")?;
        self.blocklist.complete(ps).context("blocklist")?;

        Ok(())
    }
}

impl GateConfig {
    const MAX_PAYLOAD_LIMIT_MIB: usize = 64;
    const MIN_PAYLOAD_LIMIT_MIB: usize = 1;

    pub fn default_bind() -> String {
        String::from("127.0.0.1:8080")
    }

    pub fn default_ssl() -> bool {
        false
    }

    pub fn default_cert_path() -> String {
        String::new()
    }

    pub fn default_key_path() -> String {
        String::new()
    }

    pub fn default_keep_alive_secs() -> u64 {
        0
    }

    pub fn default_workers() -> u64 {
        0
    }

    pub fn default_payload_limit_mib() -> usize {
        10
    }

    pub fn default_upstream() -> String {
        String::from("http://127.0.0.1:8081")
    }

    pub fn default_login_url() -> String {
        String::new()
    }

    pub fn default_service_prefix() -> String {
        String::new()
    }
}

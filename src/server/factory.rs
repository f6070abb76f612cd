use std::sync::Arc;

use anyhow::{Context, Result};
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslMethod};

use crate::server::authn::factory::AuthnFactory;
use crate::server::authz::factory::AuthzFactory;
use crate::server::blocklist::MemoryBlockList;
use crate::server::gate::{Gate, GateOptions};
use crate::server::handlers::healthz::HealthzHandler;
use crate::server::handlers::proxy::ProxyForwarder;
use crate::server::resolver::factory::ResolverFactory;

use super::config::GateConfig;
use super::restful::{RestfulContext, RestfulServer};

pub struct ServerFactory {
    cfg: GateConfig,
}

impl ServerFactory {
    pub fn new(cfg: GateConfig) -> Self {
        Self { cfg }
    }

    pub fn build_server(&self) -> Result<RestfulServer> {
        let ssl = self.build_ssl()?;
        let ctx = self.build_context()?;

        let mut srv =
            RestfulServer::new(self.cfg.bind.clone(), ssl, ctx, self.cfg.payload_limit_mib);
        if self.cfg.keep_alive_secs > 0 {
            srv.set_keep_alive_secs(self.cfg.keep_alive_secs);
        }
        if self.cfg.workers > 0 {
            srv.set_workers(self.cfg.workers);
        }

        Ok(srv)
    }

    pub fn build_ssl(&self) -> Result<Option<SslAcceptorBuilder>> {
        if !self.cfg.ssl {
            return Ok(None);
        }

        let mut builder =
            SslAcceptor::mozilla_intermediate(SslMethod::tls()).context("init ssl acceptor")?;

        builder
            .set_private_key_file(&self.cfg.key_path, openssl::ssl::SslFiletype::PEM)
            .context("load ssl key file")?;
        builder
            .set_certificate_chain_file(&self.cfg.cert_path)
            .context("load ssl cert file")?;

        Ok(Some(builder))
    }

    /// Builds the gate and its collaborators without binding anything.
    pub fn build_gate(&self) -> Result<Gate> {
        let resolver_factory = ResolverFactory::new();
        let resolver = resolver_factory.build_resolver(&self.cfg.resolver);

        let authn_factory = AuthnFactory::new();
        let inspector = authn_factory
            .build_inspector(&self.cfg.authn)
            .context("init inspector")?;

        let blocklist = MemoryBlockList::new(&self.cfg.blocklist.accounts);

        let authz_factory = AuthzFactory::new();
        let verifier = authz_factory.build_verifier(&self.cfg.authz);

        let options = GateOptions {
            token_cookie: self.cfg.authn.token_cookie.clone(),
            login_url: self.cfg.login_url.clone(),
            service_prefix: self.cfg.service_prefix.clone(),
        };

        Ok(Gate::new(
            Arc::new(resolver),
            Arc::new(inspector),
            Arc::new(blocklist),
            Arc::new(verifier),
            options,
        ))
    }

    pub fn build_context(&self) -> Result<Arc<RestfulContext>> {
        let gate = self.build_gate()?;
        let forwarder =
            ProxyForwarder::new(&self.cfg.upstream).context("init upstream forwarder")?;

        let ctx = RestfulContext {
            gate,
            forwarder: Arc::new(forwarder),
            healthz_handler: HealthzHandler::new(),
        };
        Ok(Arc::new(ctx))
    }
}

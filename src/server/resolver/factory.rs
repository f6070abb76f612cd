use log::info;

use super::config::{ResolverConfig, ResolverKind};
use super::{HttpResolver, RouteTable, RpcResolver, SubdomainResolver, UnionResolver};

/// Builds the request resolver from configuration.
///
/// The path resolver (`rpc` or `http`) is always built; when `subdomain` is
/// enabled it is wrapped so the domain comes from the request host.
pub struct ResolverFactory;

impl ResolverFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build_resolver(&self, cfg: &ResolverConfig) -> UnionResolver {
        let table = RouteTable::new(cfg.domain.clone(), cfg.services.iter().cloned().collect());

        let resolver = match cfg.kind {
            ResolverKind::Rpc => UnionResolver::Rpc(RpcResolver::new(table)),
            ResolverKind::Http => UnionResolver::Http(HttpResolver::new(table)),
        };

        if !cfg.subdomain {
            return resolver;
        }

        info!(
            "Subdomain resolver is enabled, base domains: {:?}",
            cfg.base_domains
        );
        UnionResolver::Subdomain(SubdomainResolver::new(
            resolver,
            cfg.base_domains.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CommonConfig;
    use crate::server::resolver::Resolver;

    use super::*;

    #[test]
    fn test_factory() {
        let factory = ResolverFactory::new();

        let cfg = ResolverConfig::default();
        let resolver = factory.build_resolver(&cfg);
        assert!(matches!(resolver, UnionResolver::Rpc(_)));
        assert!(resolver.domain_resolver().is_none());

        let mut cfg = ResolverConfig::default();
        cfg.kind = ResolverKind::Http;
        let resolver = factory.build_resolver(&cfg);
        assert!(matches!(resolver, UnionResolver::Http(_)));

        let mut cfg = ResolverConfig::default();
        cfg.subdomain = true;
        cfg.base_domains = vec![String::from("example.com")];
        let resolver = factory.build_resolver(&cfg);
        assert!(matches!(resolver, UnionResolver::Subdomain(_)));
        assert!(resolver.domain_resolver().is_some());
    }
}

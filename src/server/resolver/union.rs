use actix_web::HttpRequest;

use super::http::HttpResolver;
use super::rpc::RpcResolver;
use super::subdomain::SubdomainResolver;
use super::{DomainResolver, Endpoint, ResolveError, Resolver};

pub enum UnionResolver {
    Rpc(RpcResolver),
    Http(HttpResolver),
    Subdomain(SubdomainResolver),
}

impl Resolver for UnionResolver {
    fn resolve(&self, req: &HttpRequest) -> Result<Endpoint, ResolveError> {
        match self {
            UnionResolver::Rpc(r) => r.resolve(req),
            UnionResolver::Http(r) => r.resolve(req),
            UnionResolver::Subdomain(r) => r.resolve(req),
        }
    }

    fn domain_resolver(&self) -> Option<&dyn DomainResolver> {
        match self {
            UnionResolver::Rpc(r) => r.domain_resolver(),
            UnionResolver::Http(r) => r.domain_resolver(),
            UnionResolver::Subdomain(r) => r.domain_resolver(),
        }
    }
}

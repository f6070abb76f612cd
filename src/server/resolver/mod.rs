mod http;
mod rpc;
mod subdomain;
mod union;

pub mod config;
pub mod factory;

use std::collections::HashSet;

use actix_web::HttpRequest;
use thiserror::Error;

pub use http::HttpResolver;
pub use rpc::RpcResolver;
pub use subdomain::SubdomainResolver;
pub use union::UnionResolver;

/// The logical target of a request, as determined by routing.
///
/// Produced once per request by a [`Resolver`] and never changed afterwards,
/// except for the gate backfilling an empty `domain` through a
/// [`DomainResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    /// Service name, e.g. `users`.
    pub name: String,
    /// RPC style method (`Users.Read`), or empty if the resolver only knows
    /// the transport method.
    pub path: String,
    /// Transport method, e.g. `GET`.
    pub method: String,
    /// Namespace the endpoint is served from.
    pub domain: String,
}

impl Endpoint {
    /// Endpoint for a request the resolver could not route (`/favicon.ico`,
    /// static files, malformed paths). Only the raw path is known.
    pub fn unrouted(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid path")]
    InvalidPath,

    #[error("service not found")]
    NotFound,

    #[error("resolve endpoint: {0}")]
    Other(String),
}

impl ResolveError {
    /// Recoverable errors let the request continue with an unrouted endpoint.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ResolveError::InvalidPath | ResolveError::NotFound)
    }
}

/// Maps an inbound request to an [`Endpoint`].
pub trait Resolver: Send + Sync {
    fn resolve(&self, req: &HttpRequest) -> Result<Endpoint, ResolveError>;

    /// Capability probe: resolvers that can derive a domain straight from the
    /// request (e.g. from the host) return themselves here.
    fn domain_resolver(&self) -> Option<&dyn DomainResolver> {
        None
    }
}

pub trait DomainResolver: Send + Sync {
    /// Returns the domain for the request, or an empty string if none can be
    /// derived.
    fn domain(&self, req: &HttpRequest) -> String;
}

/// Shared path handling for the path based resolvers.
#[derive(Debug, Clone)]
pub struct RouteTable {
    domain: String,
    services: HashSet<String>,
}

impl RouteTable {
    pub fn new(domain: String, services: HashSet<String>) -> Self {
        Self { domain, services }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Splits `path` into the service name and the remaining segments.
    pub fn route<'a>(&self, path: &'a str) -> Result<(&'a str, Vec<&'a str>), ResolveError> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Err(ResolveError::InvalidPath);
        }

        let mut parts = path.split('/');
        let service = parts.next().unwrap_or_default();
        if !is_valid_service_name(service) {
            return Err(ResolveError::InvalidPath);
        }
        if !self.services.is_empty() && !self.services.contains(service) {
            return Err(ResolveError::NotFound);
        }

        let rest: Vec<&str> = parts.filter(|part| !part.is_empty()).collect();
        Ok((service, rest))
    }
}

pub fn is_valid_service_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

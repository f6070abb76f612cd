use std::net::IpAddr;

use actix_web::http::header;
use actix_web::HttpRequest;

use super::union::UnionResolver;
use super::{DomainResolver, Endpoint, ResolveError, Resolver};

/// Wraps another resolver and derives the endpoint domain from the request
/// host.
///
/// With base domain `example.com`, the host `staging.foo.example.com` maps to
/// the domain `foo-staging`: the labels in front of the base domain, reversed
/// and joined with `-`. Hosts that are IP addresses, `localhost`, or outside
/// every base domain yield no domain, and the inner resolver's domain is kept.
pub struct SubdomainResolver {
    inner: Box<UnionResolver>,
    base_domains: Vec<String>,
}

impl SubdomainResolver {
    pub fn new(inner: UnionResolver, base_domains: Vec<String>) -> Self {
        Self {
            inner: Box::new(inner),
            base_domains,
        }
    }

    fn host(req: &HttpRequest) -> Option<String> {
        let host = match req.headers().get(header::HOST) {
            Some(value) => value.to_str().ok()?.to_string(),
            None => req.uri().host()?.to_string(),
        };
        Some(host.to_lowercase())
    }

    fn domain_for_host(&self, host: &str) -> String {
        // IPv6 literal, e.g. [::1]:8080
        if host.starts_with('[') {
            return String::new();
        }
        let host = host.split(':').next().unwrap_or_default();
        let host = host.trim_end_matches('.');
        if host.is_empty() || host == "localhost" || host.parse::<IpAddr>().is_ok() {
            return String::new();
        }

        for base in self.base_domains.iter() {
            let prefix = match host.strip_suffix(base.as_str()) {
                Some(prefix) => prefix,
                None => continue,
            };
            let prefix = match prefix.strip_suffix('.') {
                Some(prefix) => prefix,
                // Either the bare base domain or a partial label match
                // (`notexample.com`), neither has a subdomain.
                None => continue,
            };
            if prefix.is_empty() {
                continue;
            }

            let labels: Vec<&str> = prefix.split('.').rev().collect();
            return labels.join("-");
        }

        String::new()
    }
}

impl Resolver for SubdomainResolver {
    fn resolve(&self, req: &HttpRequest) -> Result<Endpoint, ResolveError> {
        let mut endpoint = self.inner.resolve(req)?;
        let domain = self.domain(req);
        if !domain.is_empty() {
            endpoint.domain = domain;
        }
        Ok(endpoint)
    }

    fn domain_resolver(&self) -> Option<&dyn DomainResolver> {
        Some(self)
    }
}

impl DomainResolver for SubdomainResolver {
    fn domain(&self, req: &HttpRequest) -> String {
        match Self::host(req) {
            Some(host) => self.domain_for_host(&host),
            None => String::new(),
        }
    }
}

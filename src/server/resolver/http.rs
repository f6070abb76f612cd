use actix_web::HttpRequest;

use super::{Endpoint, ResolveError, Resolver, RouteTable};

/// Resolves the service from the first path segment and keeps only the
/// transport method. Endpoints produced here never carry an RPC path.
pub struct HttpResolver {
    table: RouteTable,
}

impl HttpResolver {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }
}

impl Resolver for HttpResolver {
    fn resolve(&self, req: &HttpRequest) -> Result<Endpoint, ResolveError> {
        let (service, _) = self.table.route(req.path())?;
        Ok(Endpoint {
            name: service.to_string(),
            path: String::new(),
            method: req.method().as_str().to_string(),
            domain: self.table.domain().to_string(),
        })
    }
}

use actix_web::HttpRequest;

use super::{Endpoint, ResolveError, Resolver, RouteTable};

/// Resolves `/service/method` style paths into RPC endpoints.
///
/// * `/users` -> `users`, no RPC method
/// * `/users/read` -> `users`, `Users.Read`
/// * `/users/account/read` -> `users`, `Account.Read`
pub struct RpcResolver {
    table: RouteTable,
}

impl RpcResolver {
    pub fn new(table: RouteTable) -> Self {
        Self { table }
    }

    fn rpc_method(service: &str, rest: &[&str]) -> String {
        match rest {
            [] => String::new(),
            [method] => format!("{}.{}", title(service), title(method)),
            [.., handler, method] => format!("{}.{}", title(handler), title(method)),
        }
    }
}

impl Resolver for RpcResolver {
    fn resolve(&self, req: &HttpRequest) -> Result<Endpoint, ResolveError> {
        let (service, rest) = self.table.route(req.path())?;
        Ok(Endpoint {
            name: service.to_string(),
            path: Self::rpc_method(service, &rest),
            method: req.method().as_str().to_string(),
            domain: self.table.domain().to_string(),
        })
    }
}

fn title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

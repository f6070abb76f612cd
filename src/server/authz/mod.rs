pub mod config;
pub mod factory;
pub mod rule;

use async_trait::async_trait;
use thiserror::Error;

use super::authn::Account;
use super::resolver::Endpoint;

pub const RESOURCE_TYPE_SERVICE: &str = "service";

/// The target of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: String,
    pub name: String,
    pub endpoint: String,
}

impl Resource {
    /// Builds the service resource for an endpoint.
    ///
    /// The name is `<prefix>.<service>` when a prefix is configured. The
    /// endpoint is the RPC path, falling back to the transport method for
    /// resolvers that never fill the path.
    pub fn for_endpoint(endpoint: &Endpoint, service_prefix: &str) -> Self {
        let name = if service_prefix.is_empty() {
            endpoint.name.clone()
        } else {
            format!("{service_prefix}.{}", endpoint.name)
        };

        let resource_endpoint = if endpoint.path.is_empty() {
            endpoint.method.clone()
        } else {
            endpoint.path.clone()
        };

        Self {
            kind: String::from(RESOURCE_TYPE_SERVICE),
            name,
            endpoint: resource_endpoint,
        }
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    Other(String),
}

/// Decides whether an account (or an anonymous caller) may access a
/// resource within a namespace.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        account: Option<&Account>,
        resource: &Resource,
        namespace: &str,
    ) -> Result<(), VerifyError>;
}

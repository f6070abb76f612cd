pub mod config;
pub mod factory;
pub mod jwt;

use std::collections::HashMap;

use thiserror::Error;

/// An authenticated identity and the namespace that issued it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    /// Account identifier, unique within the issuer.
    pub id: String,
    /// Namespace that issued the account.
    pub issuer: String,
    /// Capabilities granted to the account, matched against rule scopes.
    pub scopes: Vec<String>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("empty token")]
    EmptyToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Turns a bearer credential into an [`Account`].
///
/// Failing to inspect a token is not an error for the caller: the request
/// simply carries no account.
pub trait Inspector: Send + Sync {
    fn inspect(&self, token: &str) -> Result<Account, InspectError>;
}

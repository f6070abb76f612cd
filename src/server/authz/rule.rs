use std::cmp::Reverse;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::server::authn::Account;

use super::{Resource, Verifier, VerifyError};

/// Scope matching every caller, including anonymous ones.
pub const SCOPE_PUBLIC: &str = "";
/// Scope matching any authenticated account.
pub const SCOPE_ACCOUNT: &str = "*";

/// A single access rule.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Rule {
    #[serde(default)]
    pub id: String,

    /// Namespace the rule belongs to, empty for every namespace.
    #[serde(default)]
    pub namespace: String,

    /// `""` for public access, `"*"` for any account, otherwise a scope the
    /// account must carry.
    #[serde(default)]
    pub scope: String,

    pub resource: ResourcePattern,

    #[serde(default)]
    pub access: Access,

    /// Rules are evaluated from the highest priority down.
    #[serde(default)]
    pub priority: i32,
}

/// Resource matcher. Each field is `*`, an exact value, or a prefix ending
/// with `*` (`Users.*`, `/static/*`).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ResourcePattern {
    #[serde(rename = "type", default = "ResourcePattern::any")]
    pub kind: String,

    #[serde(default = "ResourcePattern::any")]
    pub name: String,

    #[serde(default = "ResourcePattern::any")]
    pub endpoint: String,
}

impl ResourcePattern {
    pub fn any() -> String {
        String::from("*")
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        is_match(&self.kind, &resource.kind)
            && is_match(&self.name, &resource.name)
            && is_match(&self.endpoint, &resource.endpoint)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum Access {
    #[serde(rename = "granted")]
    #[default]
    Granted,

    #[serde(rename = "denied")]
    Denied,
}

impl Rule {
    fn applies(&self, resource: &Resource, namespace: &str) -> bool {
        (self.namespace.is_empty() || self.namespace == namespace)
            && self.resource.matches(resource)
    }

    /// Returns true if the rule's scope covers the caller.
    fn covers(&self, account: Option<&Account>) -> bool {
        match self.scope.as_str() {
            SCOPE_PUBLIC => true,
            SCOPE_ACCOUNT => account.is_some(),
            scope => account.is_some_and(|acc| acc.scopes.iter().any(|s| s == scope)),
        }
    }
}

/// Permission evaluator backed by a static list of rules.
///
/// The first rule (by descending priority, denials first on ties) that
/// applies to the resource and covers the caller decides. Nothing matching
/// means forbidden.
pub struct RuleVerifier {
    rules: Vec<Rule>,
}

impl RuleVerifier {
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|rule| (Reverse(rule.priority), rule.access == Access::Granted));
        Self { rules }
    }

    pub fn check(
        &self,
        account: Option<&Account>,
        resource: &Resource,
        namespace: &str,
    ) -> Result<(), VerifyError> {
        let rule = self
            .rules
            .iter()
            .filter(|rule| rule.applies(resource, namespace))
            .find(|rule| rule.covers(account));
        match rule.map(|rule| rule.access) {
            Some(Access::Granted) => Ok(()),
            Some(Access::Denied) | None => Err(VerifyError::Forbidden),
        }
    }
}

#[async_trait]
impl Verifier for RuleVerifier {
    async fn verify(
        &self,
        account: Option<&Account>,
        resource: &Resource,
        namespace: &str,
    ) -> Result<(), VerifyError> {
        self.check(account, resource, namespace)
    }
}

/// Matches a rule field against a resource value.
pub fn is_match(pattern: &str, value: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    match pattern.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => pattern == value,
    }
}

use std::collections::HashSet;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

use super::rule::Rule;

/// Authorization related configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthzConfig {
    /// Access rules. A request that no rule grants is forbidden, so an empty
    /// list denies everything.
    /// Defaults to empty.
    #[serde(default = "AuthzConfig::default_rules")]
    pub rules: Vec<Rule>,
}

impl CommonConfig for AuthzConfig {
    fn default() -> Self {
        Self {
            rules: Self::default_rules(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        let mut ids = HashSet::new();
        for (idx, rule) in self.rules.iter().enumerate() {
            if !rule.id.is_empty() && !ids.insert(rule.id.as_str()) {
                bail!("duplicate rule id '{}'", rule.id);
            }

            let fields = [
                ("type", &rule.resource.kind),
                ("name", &rule.resource.name),
                ("endpoint", &rule.resource.endpoint),
            ];
            for (field, value) in fields {
                if value.is_empty() {
                    bail!("rule #{idx}: resource {field} cannot be empty, use '*' to match any");
                }
                if value.trim_end_matches('*').contains('*') {
                    bail!("rule #{idx}: resource {field} '{value}' can only end with '*'");
                }
            }
        }

        Ok(())
    }
}

impl AuthzConfig {
    pub fn default_rules() -> Vec<Rule> {
        vec![]
    }
}

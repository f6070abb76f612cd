use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlocklistConfig {
    /// Accounts rejected with 401 whatever their permissions are.
    #[serde(default = "BlocklistConfig::default_accounts")]
    pub accounts: Vec<BlockedAccount>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct BlockedAccount {
    pub id: String,
    pub issuer: String,
}

impl CommonConfig for BlocklistConfig {
    fn default() -> Self {
        Self {
            accounts: Self::default_accounts(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        for account in self.accounts.iter() {
            if account.id.is_empty() || account.issuer.is_empty() {
                bail!("blocked account requires both id and issuer");
            }
        }
        Ok(())
    }
}

impl BlocklistConfig {
    pub fn default_accounts() -> Vec<BlockedAccount> {
        vec![]
    }
}

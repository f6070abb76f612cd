use std::collections::HashSet;
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::config::BlockedAccount;
use super::BlockList;

/// In-process blocklist.
pub struct MemoryBlockList {
    accounts: RwLock<HashSet<(String, String)>>,
}

impl MemoryBlockList {
    pub fn new(accounts: &[BlockedAccount]) -> Self {
        let accounts = accounts
            .iter()
            .map(|acc| (acc.issuer.clone(), acc.id.clone()))
            .collect();
        Self {
            accounts: RwLock::new(accounts),
        }
    }

    pub fn block(&self, id: &str, issuer: &str) -> Result<()> {
        let mut accounts = match self.accounts.write() {
            Ok(accounts) => accounts,
            Err(_) => bail!("blocklist lock poisoned"),
        };
        accounts.insert((issuer.to_string(), id.to_string()));
        Ok(())
    }

    pub fn unblock(&self, id: &str, issuer: &str) -> Result<()> {
        let mut accounts = match self.accounts.write() {
            Ok(accounts) => accounts,
            Err(_) => bail!("blocklist lock poisoned"),
        };
        accounts.remove(&(issuer.to_string(), id.to_string()));
        Ok(())
    }
}

#[async_trait]
impl BlockList for MemoryBlockList {
    async fn is_blocked(&self, id: &str, issuer: &str) -> Result<bool> {
        let accounts = match self.accounts.read() {
            Ok(accounts) => accounts,
            Err(_) => bail!("blocklist lock poisoned"),
        };
        Ok(accounts.contains(&(issuer.to_string(), id.to_string())))
    }
}

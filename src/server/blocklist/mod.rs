mod memory;

pub mod config;

use anyhow::Result;
use async_trait::async_trait;

pub use memory::MemoryBlockList;

/// Denylist of accounts, keyed by account id and issuing namespace.
#[async_trait]
pub trait BlockList: Send + Sync {
    async fn is_blocked(&self, id: &str, issuer: &str) -> Result<bool>;
}

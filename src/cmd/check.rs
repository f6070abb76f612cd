use anyhow::{Context, Result};
use clap::Args;
use micro_gate::server::factory::ServerFactory;

use super::ConfigArgs;

/// Validate the configuration and build every gate collaborator, without
/// binding the server.
#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl CheckArgs {
    pub fn run(&self) -> Result<()> {
        let cfg = self.config.load()?;
        let rules = cfg.authz.rules.len();
        let blocked = cfg.blocklist.accounts.len();

        let factory = ServerFactory::new(cfg);
        factory.build_ssl().context("check ssl")?;
        factory.build_context().context("check gate")?;

        println!("Config OK: {rules} rules, {blocked} blocked accounts");
        Ok(())
    }
}

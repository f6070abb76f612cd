use anyhow::{Context, Result};
use clap::Args;
use log::info;
use micro_gate::server::factory::ServerFactory;

use super::ConfigArgs;

/// Start the gate server, forwarding allowed requests to the upstream.
#[derive(Args)]
pub struct ServeArgs {
    /// Print the completed configuration (JSON) and exit.
    #[clap(long)]
    pub print_config: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ServeArgs {
    pub async fn run(&self) -> Result<()> {
        let cfg = self.config.load()?;

        if self.print_config {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            return Ok(());
        }

        cfg.logs.init()?;
        info!("Forwarding allowed requests to {}", cfg.upstream);

        let factory = ServerFactory::new(cfg);
        let srv = factory.build_server().context("build server")?;
        srv.run().await
    }
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use micro_gate::config::{CommonConfig, PathSet};
use micro_gate::server::config::GateConfig;

mod check;
mod serve;

#[derive(Parser)]
#[command(author, version, about)]
pub struct App {
    #[command(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Serve(serve::ServeArgs),
    Check(check::CheckArgs),
}

impl App {
    pub async fn run(&self) -> Result<()> {
        match &self.commands {
            Commands::Serve(args) => args.run().await,
            Commands::Check(args) => args.run(),
        }
    }
}

#[derive(Args)]
pub struct ConfigArgs {
    /// The config directory, default is `$MICRO_GATE_CONFIG`, then
    /// `/etc/micro-gate` for root and `~/.config/micro-gate` for others.
    #[clap(long)]
    pub config_path: Option<PathBuf>,
}

impl ConfigArgs {
    const CONFIG_NAME: &str = "gate";

    pub fn load(&self) -> Result<GateConfig> {
        let ps = PathSet::new(self.config_path.clone())?;
        ps.load_config(Self::CONFIG_NAME, GateConfig::default)
    }
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(about = "Caches sensor readings from the peer link and serves the dashboard")]
pub struct Args {
    /// hub.toml to load instead of the well-known locations
    #[arg(long, env = "HUB_CONFIG")]
    pub config: Option<PathBuf>,
}

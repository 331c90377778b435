use clap::Parser;
use tracing_subscriber::EnvFilter;

use synergy_cli::args::Cli;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(synergy_common::env::SYNERGY_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    synergy_cli::run(cli)
}

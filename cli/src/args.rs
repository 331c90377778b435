//! Startup argument parsing (spec §4.J, SPEC_FULL §1.3).
//!
//! Flags are read once, here, and threaded through explicitly as a
//! [`Config`] rather than re-read from the environment deep in the call
//! stack — the one deliberate exception is provider API keys, which the
//! dispatcher still reads lazily per request (SPEC_FULL §1.3).

use std::path::PathBuf;

use clap::Parser;
use synergy_common::paths::SynergyPaths;
use synergy_core::TransportConfig;

/// `synergy [options]`: a single-mode REPL, not a multi-subcommand tool.
#[derive(Debug, Parser)]
#[command(name = "synergy", author, version, about = "Synergy: an interactive terminal client for chat-completion providers")]
pub struct Cli {
    /// Root directory for dumps and other on-disk state. Overrides
    /// `SYNERGY_ROOT`.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Active model shortname at startup. Overrides the registry default.
    #[arg(long, value_name = "SHORTNAME")]
    pub model: Option<String>,

    /// Skip HTTP entirely and return the canned offline response. Overrides
    /// `SYNERGY_OFFLINE`.
    #[arg(long)]
    pub offline: bool,

    /// Suppress the startup banner. Useful for scripted/piped sessions.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Resolved startup configuration, built once from [`Cli`] and the
/// environment.
pub struct Config {
    pub paths: SynergyPaths,
    pub quiet: bool,
    pub model_override: Option<String>,
    pub transport: TransportConfig,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Self {
        let paths = SynergyPaths::resolve(cli.root);
        let mut transport = TransportConfig::from_env();
        if cli.offline {
            transport.offline = true;
        }
        Self { paths, quiet: cli.quiet, model_override: cli.model, transport }
    }
}

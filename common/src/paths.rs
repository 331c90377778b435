//! Resolution of `SYNERGY_ROOT` and the directories that hang off it.

use std::path::{Path, PathBuf};

use crate::env::SYNERGY_ROOT;

/// The root directory under which Synergy keeps its dumps, history, and any
/// other on-disk state. Resolved once at startup (spec §4.J) and threaded
/// through explicitly rather than read from the environment again.
#[derive(Debug, Clone)]
pub struct SynergyPaths {
    root: PathBuf,
}

impl SynergyPaths {
    /// `explicit_root` takes precedence (the `--root` CLI flag); otherwise
    /// `SYNERGY_ROOT` is consulted; otherwise falls back to the user's home
    /// directory joined with `.synergy`.
    pub fn resolve(explicit_root: Option<PathBuf>) -> Self {
        let root = explicit_root
            .or_else(|| std::env::var_os(SYNERGY_ROOT).map(PathBuf::from))
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".synergy"));
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dumps_dir(&self) -> PathBuf {
        self.root.join("etc").join("dumps")
    }
}

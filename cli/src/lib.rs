//! `synergy`: the interactive terminal client (spec §4.I, §4.J).
//!
//! This crate owns argument parsing and startup (`args`), the session
//! aggregate the REPL mutates (`session`), the meta-command implementations
//! (`commands`), and the read-eval-print loop itself (`repl`).

pub mod args;
pub mod commands;
pub mod repl;
pub mod session;

pub use repl::run;

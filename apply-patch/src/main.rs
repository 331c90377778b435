//! Stand-alone `apply_patch <file> <diff>` binary, useful for exercising the
//! patch engine by hand without going through the full REPL.

use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let (Some(path), Some(diff)) = (args.next(), args.next()) else {
        eprintln!("usage: apply_patch <file> <diff>");
        return ExitCode::FAILURE;
    };

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("ERROR: {err}");
            return ExitCode::FAILURE;
        }
    };

    match synergy_apply_patch::apply_patch(&cwd, Path::new(&path), &diff) {
        Ok(report) => {
            for warning in &report.warnings {
                println!("{warning}");
            }
            println!("Applied edits to file '{path}'");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("ERROR: {err}");
            ExitCode::FAILURE
        }
    }
}

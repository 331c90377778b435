//! The `,exec` read-only shell sandbox (spec §4.H).

pub mod error;

pub use error::ExecError;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

/// Read-only tools `,exec` is allowed to run (spec §6).
pub const ALLOWED_COMMANDS: &[&str] = &[
    "grep", "egrep", "fgrep", "ls", "wc", "cat", "head", "tail", "find", "file", "diff", "stat",
    "sort", "uniq", "tr", "awk", "sed",
];

/// Shell metacharacters that are rejected wherever they appear in an argv
/// token, regardless of which command is named (spec §4.H).
const METACHARACTERS: &[char] = &[';', '&', '|', '`', '$', '>', '<', '(', ')', '\n'];

pub fn allowed_commands_display() -> String {
    ALLOWED_COMMANDS.join(", ")
}

/// Validates `argv` without running it: non-empty, no metacharacters
/// anywhere, and `argv[0]`'s basename on the allow-list.
pub fn validate(argv: &[String]) -> Result<(), ExecError> {
    let Some(program) = argv.first() else {
        return Err(ExecError::NoCommand);
    };
    if program.is_empty() {
        return Err(ExecError::NoCommand);
    }

    for token in argv {
        if token.chars().any(|c| METACHARACTERS.contains(&c)) {
            return Err(ExecError::Metacharacter);
        }
    }

    let basename = Path::new(program)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(program.as_str());
    if !ALLOWED_COMMANDS.contains(&basename) {
        return Err(ExecError::Disallowed(program.clone()));
    }

    Ok(())
}

/// Output of a validated, executed `,exec` command.
#[derive(Debug, Clone)]
pub struct ExecCapture {
    pub cmd_line: String,
    pub stdout: String,
    pub exit_status: i32,
    pub capture_path: PathBuf,
}

/// Validates, runs, and captures `argv`'s stdout to a file under
/// `capture_dir`. A non-zero exit is not an error here — the caller (the
/// REPL) emits the `WARNING: Command exited with status <code>` line; the
/// captured output is still returned and still pushed onto the stack.
pub fn run(capture_dir: &Path, argv: &[String]) -> Result<ExecCapture, ExecError> {
    validate(argv)?;

    let cmd_line = argv.join(" ");
    debug!(cmd = %cmd_line, "running ,exec command");

    let output = Command::new(&argv[0]).args(&argv[1..]).output()?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let exit_status = output.status.code().unwrap_or(-1);
    if exit_status != 0 {
        warn!(status = exit_status, cmd = %cmd_line, "exec command exited non-zero");
    }

    std::fs::create_dir_all(capture_dir)?;
    let capture_path = capture_dir.join(capture_filename());
    std::fs::write(&capture_path, &stdout)?;

    Ok(ExecCapture { cmd_line, stdout, exit_status, capture_path })
}

fn capture_filename() -> String {
    let pid = std::process::id();
    let ts = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    format!("synergy_exec_pid_{pid}_timestamp_{ts}.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn no_command_is_rejected() {
        let err = validate(&[]).unwrap_err();
        assert!(matches!(err, ExecError::NoCommand));
    }

    #[test]
    fn disallowed_command_is_rejected() {
        let argv = vec!["rm".to_string(), "-rf".to_string(), "/".to_string()];
        let err = validate(&argv).unwrap_err();
        assert!(matches!(err, ExecError::Disallowed(cmd) if cmd == "rm"));
    }

    #[test]
    fn metacharacters_are_rejected_regardless_of_command() {
        let argv = vec!["ls".to_string(), "foo; rm -rf /".to_string()];
        let err = validate(&argv).unwrap_err();
        assert!(matches!(err, ExecError::Metacharacter));
    }

    #[test]
    fn allowed_command_passes_validation() {
        let argv = vec!["ls".to_string(), "-la".to_string()];
        assert!(validate(&argv).is_ok());
    }

    #[test]
    fn disallowed_binary_is_never_spawned_even_with_path_prefix() {
        let argv = vec!["/bin/rm".to_string(), "-rf".to_string(), "/".to_string()];
        let err = validate(&argv).unwrap_err();
        assert!(matches!(err, ExecError::Disallowed(_)));
    }

    #[test]
    fn run_captures_stdout_to_a_file() {
        let dir = TempDir::new().expect("tmp");
        let argv = vec!["ls".to_string(), dir.path().to_string_lossy().into_owned()];
        let capture = run(dir.path(), &argv).expect("run");
        assert_eq!(capture.exit_status, 0);
        assert!(capture.capture_path.exists());
        assert_eq!(std::fs::read_to_string(&capture.capture_path).expect("read"), capture.stdout);
    }
}

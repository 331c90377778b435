//! End-to-end REPL scenarios (spec §8, S1-S6) driven through `assert_cmd`,
//! the way the teacher drives its own CLI in `cli/tests/*.rs`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn synergy() -> Command {
    Command::cargo_bin("synergy").expect("binary builds")
}

fn write_file(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

/// S1: `,help` then `,exit` prints the command-processor banner and exits 0.
#[test]
fn s1_help_then_exit() {
    let root = TempDir::new().expect("tmp");
    synergy()
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin(",help\n,exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("This is Synergy. You are interacting with the command processor."));
}

/// S2: pushing a file then `,s` shows a one-line, newline-collapsed preview.
#[test]
fn s2_push_then_show_collapses_newlines() {
    let root = TempDir::new().expect("tmp");
    let workdir = TempDir::new().expect("tmp");
    let file = write_file(workdir.path(), "note.txt", "Test file content.\nLine 2.\n");

    synergy()
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin(format!(",push {}\n,s\n,exit\n", file.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("contents: Test file content. Line 2."));
}

/// S3: pushing five files then `,drop 2` removes the third file from the
/// stack and leaves the rest.
#[test]
fn s3_drop_by_index_removes_that_item_only() {
    let root = TempDir::new().expect("tmp");
    let workdir = TempDir::new().expect("tmp");
    let files: Vec<_> = (1..=5).map(|i| write_file(workdir.path(), &format!("file{i}.txt"), &format!("body {i}\n"))).collect();

    let mut stdin = String::new();
    for file in &files {
        stdin.push_str(&format!(",push {}\n", file.display()));
    }
    stdin.push_str(",drop 2\n,s\n,exit\n");

    let assert = synergy()
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin(stdin)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(!stdout.contains("file3.txt"));
    assert!(stdout.contains("file1.txt"));
    assert!(stdout.contains("file5.txt"));
}

/// S4: pushing six files then `,rot` moves the bottom item (file1) to the
/// top and file6 to second-from-top.
#[test]
fn s4_rot_moves_bottom_to_top() {
    let root = TempDir::new().expect("tmp");
    let workdir = TempDir::new().expect("tmp");
    let files: Vec<_> = (1..=6).map(|i| write_file(workdir.path(), &format!("file{i}.txt"), &format!("body {i}\n"))).collect();

    let mut stdin = String::new();
    for file in &files {
        stdin.push_str(&format!(",push {}\n", file.display()));
    }
    stdin.push_str(",rot\n,s\n,exit\n");

    let assert = synergy()
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin(stdin)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let display_lines: Vec<&str> = stdout.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(display_lines.len(), 6);
    assert!(display_lines.last().expect("top line").contains("file1.txt"));
    assert!(display_lines.last().expect("top line").contains('*'));
    assert!(display_lines[display_lines.len() - 2].contains("file6.txt"));
}

/// S5: `,apply_patch` replaces a single literal block in place.
#[test]
fn s5_apply_patch_replaces_literal_block() {
    let root = TempDir::new().expect("tmp");
    let workdir = TempDir::new().expect("tmp");
    let file = write_file(workdir.path(), "foo.txt", "line1\nline2_original\nline3\n");

    let diff = "<<<<<<< ORIGINAL<NL>line2_original<NL>=======<NL>line2_replaced<NL>>>>>>> UPDATED";
    let stdin = format!(",apply_patch foo.txt {diff}\n,exit\n");

    synergy()
        .current_dir(workdir.path())
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin(stdin)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied edits to file 'foo.txt'"));

    assert_eq!(std::fs::read_to_string(&file).expect("read patched file"), "line1\nline2_replaced\nline3\n");
}

/// S6: a missing API key is reported without ever reaching the transport.
#[test]
fn s6_missing_api_key_is_reported() {
    let root = TempDir::new().expect("tmp");
    synergy()
        .env_remove("OPENAI_API_KEY")
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--model", "gpt-5"])
        .write_stdin("hello there\n,exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("ERROR: Missing API key for provider 'openai'"));
}

/// An empty (whitespace-only) query never reaches the dispatcher.
#[test]
fn empty_query_is_ignored_with_a_warning() {
    let root = TempDir::new().expect("tmp");
    synergy()
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin("   \n,exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("WARNING: Ignoring empty assistant query"));
}

/// `,exec` rejects a disallowed command without ever spawning it.
#[test]
fn exec_rejects_disallowed_command() {
    let root = TempDir::new().expect("tmp");
    synergy()
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin(",exec rm -rf /\n,exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("ERROR: Command 'rm' not allowed in ,exec mode"));
}

/// `,dump` then `,load` round-trips the stack and conversation (spec §8.2).
#[test]
fn dump_then_load_round_trips_session_state() {
    let root = TempDir::new().expect("tmp");
    let workdir = TempDir::new().expect("tmp");
    let file = write_file(workdir.path(), "a.txt", "hello\n");
    let dump_path = workdir.path().join("session.xml");

    synergy()
        .current_dir(workdir.path())
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin(format!(",push {}\n,dump session.xml\n,exit\n", file.display()))
        .assert()
        .success();
    assert!(dump_path.exists());

    synergy()
        .current_dir(workdir.path())
        .args(["--root", root.path().to_str().expect("utf8"), "-q", "--offline"])
        .write_stdin(",load session.xml\n,s\n,exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loading session ID...ok").and(predicate::str::contains("a.txt")));
}

//! Meta-command parsing and execution (spec §4.I). Every command here prints
//! its result or error directly and never returns `Err` to the REPL loop —
//! per spec §4.J/§7, a bad meta-command is local and does not end the
//! session.

use std::path::{Path, PathBuf};

use synergy_common::text;

use crate::args::Config;
use crate::session::SessionState;

/// What the REPL loop should do after a meta-command runs.
pub enum Flow {
    Continue,
    Exit,
}

/// Dispatches one `,`-prefixed line (the leading comma has already been
/// confirmed present by the caller, `line` still includes it).
pub fn dispatch_meta(line: &str, state: &mut SessionState, config: &Config) -> Flow {
    let (cmd, rest) = split_command(line);
    match cmd {
        "help" => {
            print_help();
            Flow::Continue
        }
        "exit" => Flow::Exit,
        "pwd" => {
            cmd_pwd();
            Flow::Continue
        }
        "cd" => {
            cmd_cd(rest);
            Flow::Continue
        }
        "push" => {
            cmd_push(rest, state);
            Flow::Continue
        }
        "s" => {
            println!("{}", state.stack.render_display());
            Flow::Continue
        }
        "drop" => {
            cmd_drop(rest, state);
            Flow::Continue
        }
        "swap" => {
            println!("{}", state.stack.swap());
            Flow::Continue
        }
        "rot" => {
            println!("{}", state.stack.rot());
            Flow::Continue
        }
        "reset" => {
            state.reset();
            println!("Session reset.");
            Flow::Continue
        }
        "history" => {
            cmd_history(state);
            Flow::Continue
        }
        "model" => {
            cmd_model(rest, state);
            Flow::Continue
        }
        "encoded" => {
            cmd_encoded(state);
            Flow::Continue
        }
        "dump" => {
            cmd_dump(rest, state, config);
            Flow::Continue
        }
        "load" => {
            cmd_load(rest, state);
            Flow::Continue
        }
        "apply_patch" => {
            cmd_apply_patch(rest);
            Flow::Continue
        }
        "exec" => {
            cmd_exec(rest, state);
            Flow::Continue
        }
        "comment" => {
            println!("# {rest}");
            Flow::Continue
        }
        other => {
            println!("ERROR: Unknown command ',{other}'");
            Flow::Continue
        }
    }
}

/// Splits `,cmd rest...` into (`cmd`, `rest`). `rest` is `""` when the
/// command takes no argument.
fn split_command(line: &str) -> (&str, &str) {
    let without_comma = &line[1..];
    match without_comma.find(char::is_whitespace) {
        Some(idx) => (&without_comma[..idx], without_comma[idx..].trim_start()),
        None => (without_comma, ""),
    }
}

/// First shell-style token in `rest`, honoring quotes; empty when `rest` has
/// none.
fn first_token(rest: &str) -> String {
    shlex::split(rest).and_then(|tokens| tokens.into_iter().next()).unwrap_or_default()
}

fn to_absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
    }
}

fn print_help() {
    println!("This is Synergy. You are interacting with the command processor.");
    println!("Lines not starting with ',' are sent to the active model as a query.");
    println!();
    println!("Meta-commands:");
    for line in [
        "  ,help                        show this message",
        "  ,exit                        end the session",
        "  ,pwd                         print the working directory",
        "  ,cd <dir>                    change the working directory",
        "  ,push <file>                 push a file onto the context stack",
        "  ,s                           show the context stack",
        "  ,drop [i]                    drop the top item, or item [i]",
        "  ,swap                        exchange the top two stack items",
        "  ,rot                         rotate the bottom item to the top",
        "  ,reset                       clear the stack, history, and session id",
        "  ,history                     show the conversation log",
        "  ,model [name]                show or set the active model",
        "  ,encoded                     toggle base64 attachment encoding",
        "  ,dump [file]                 serialize the session to XML",
        "  ,load <file>                 restore a session from XML",
        "  ,apply_patch <file> <diff>   apply a conflict-marker diff",
        "  ,exec <argv...>              run a read-only allow-listed command",
        "  ,comment <text>              annotate a transcript; no-op otherwise",
    ] {
        println!("{line}");
    }
}

fn cmd_pwd() {
    match std::env::current_dir() {
        Ok(path) => println!("{}", path.display()),
        Err(err) => println!("ERROR: {err}"),
    }
}

fn cmd_cd(rest: &str) {
    let target = first_token(rest);
    if target.is_empty() {
        println!("ERROR: ,cd requires a directory argument");
        return;
    }
    match std::env::set_current_dir(&target) {
        Ok(()) => cmd_pwd(),
        Err(err) => println!("ERROR: {err}"),
    }
}

fn cmd_push(rest: &str, state: &mut SessionState) {
    let path = first_token(rest);
    if path.is_empty() {
        println!("ERROR: ,push requires a file path");
        return;
    }
    state.stack.push_file(Path::new(&path));
    println!("Pushed file '{path}'");
}

fn cmd_drop(rest: &str, state: &mut SessionState) {
    let trimmed = rest.trim();
    if trimmed.is_empty() {
        println!("{}", state.stack.drop_top());
        return;
    }
    match trimmed.parse::<usize>() {
        Ok(index) => match state.stack.drop_at(index) {
            Ok(msg) => println!("{msg}"),
            Err(err) => println!("ERROR: {err}"),
        },
        Err(_) => println!("ERROR: '{trimmed}' is not a valid index"),
    }
}

/// `,history` (SPEC_FULL §3): read-only, never mutates the log.
fn cmd_history(state: &SessionState) {
    if state.convo.turns().is_empty() {
        println!("No conversation history yet");
        return;
    }
    for turn in state.convo.turns() {
        println!("{}> {}", turn.role.as_str(), text::preview(&turn.text, text::STACK_PREVIEW_CHARS));
    }
}

fn cmd_model(rest: &str, state: &mut SessionState) {
    let name = rest.trim();
    if name.is_empty() {
        println!("{}", state.registry.list().join("\n"));
        return;
    }
    match state.registry.set_active(name) {
        Ok(()) => println!("Active model set to '{name}'"),
        Err(err) => println!("ERROR: {err}"),
    }
}

/// `,encoded` (SPEC_FULL §3): toggles the flag rather than only being
/// settable at startup.
fn cmd_encoded(state: &mut SessionState) {
    state.base64_to_assistant = !state.base64_to_assistant;
    println!("base64 encoding: {}", if state.base64_to_assistant { "ON" } else { "OFF" });
}

fn cmd_dump(rest: &str, state: &SessionState, config: &Config) {
    let explicit = first_token(rest);
    let target = if explicit.is_empty() {
        let dir = config.paths.dumps_dir();
        if let Err(err) = std::fs::create_dir_all(&dir) {
            println!("ERROR: {err}");
            return;
        }
        let filename = synergy_core::default_dump_filename(state.session_uuid);
        let path = to_absolute(&dir.join(filename));
        println!("WARNING: No filename provided, using '{}'", path.display());
        path
    } else {
        to_absolute(Path::new(&explicit))
    };

    let xml = match synergy_core::dump_xml(
        &state.stack,
        &state.convo,
        state.registry.active_shortname(),
        state.session_uuid,
        &state.system_prompt,
    ) {
        Ok(xml) => xml,
        Err(err) => {
            println!("ERROR: {err}");
            return;
        }
    };

    if let Some(parent) = target.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            println!("ERROR: {err}");
            return;
        }
    }
    match std::fs::write(&target, xml) {
        Ok(()) => println!("Dumped conversation to '{}'.", target.display()),
        Err(err) => println!("ERROR: {err}"),
    }
}

fn cmd_load(rest: &str, state: &mut SessionState) {
    let path = first_token(rest);
    if path.is_empty() {
        println!("ERROR: ,load requires a file path");
        return;
    }
    let xml = match std::fs::read_to_string(&path) {
        Ok(xml) => xml,
        Err(err) => {
            println!("ERROR: {err}");
            return;
        }
    };
    match synergy_core::parse_dump(&xml) {
        Ok(loaded) => {
            if loaded.is_legacy {
                println!("WARNING: No session ID found in '{path}'");
            } else {
                println!("Loading session ID...ok");
            }
            state.adopt_loaded(loaded, uuid::Uuid::new_v4());
        }
        Err(err) => println!("ERROR: {err}"),
    }
}

/// `,apply_patch <file> <diff>`: `file` is the first whitespace-delimited
/// token, the remainder of the line (one layer of surrounding quotes
/// stripped, if present) is the diff text. The patch engine itself rewrites
/// the `<NL>` sentinel back to real newlines.
fn cmd_apply_patch(rest: &str) {
    let rest = rest.trim_start();
    let Some(split_at) = rest.find(char::is_whitespace) else {
        println!("ERROR: ,apply_patch requires a file path and a diff");
        return;
    };
    let file = &rest[..split_at];
    let diff = strip_one_quote_layer(rest[split_at..].trim_start());

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            println!("ERROR: {err}");
            return;
        }
    };

    match synergy_apply_patch::apply_patch(&cwd, Path::new(file), diff) {
        Ok(report) => {
            if report.created_file {
                println!("File '{file}' does not exist, will create new file");
            }
            for warning in &report.warnings {
                println!("{warning}");
            }
            println!("Applied edits to file '{file}'");
        }
        Err(err) => println!("ERROR: {err}"),
    }
}

fn strip_one_quote_layer(text: &str) -> &str {
    let bytes = text.as_bytes();
    if text.len() >= 2 {
        let first = bytes[0];
        let last = bytes[text.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &text[1..text.len() - 1];
        }
    }
    text
}

fn cmd_exec(rest: &str, state: &mut SessionState) {
    let Some(argv) = shlex::split(rest) else {
        println!("ERROR: unable to parse ,exec arguments");
        return;
    };

    let capture_dir = std::env::temp_dir();
    match synergy_exec::run(&capture_dir, &argv) {
        Ok(capture) => {
            if capture.exit_status != 0 {
                println!("WARNING: Command exited with status {}", capture.exit_status);
            }
            println!("{}", capture.capture_path.display());
            println!("COMMAND:\n{}\nOUTPUT:\n{}", capture.cmd_line, capture.stdout);
            state.stack.push_capture(capture.cmd_line, capture.stdout, capture.exit_status);
        }
        Err(synergy_exec::ExecError::NoCommand) => println!("ERROR: No command provided to ,exec"),
        Err(synergy_exec::ExecError::Disallowed(name)) => {
            println!("ERROR: Command '{name}' not allowed in ,exec mode");
            println!("Allowed commands: {}", synergy_exec::allowed_commands_display());
        }
        Err(synergy_exec::ExecError::Metacharacter) => println!("ERROR: Shell metacharacters not allowed"),
        Err(synergy_exec::ExecError::Io(err)) => println!("ERROR: {err}"),
    }
}

//! The read-eval-print loop (spec §4.I, §4.J). Single-threaded and
//! synchronous (spec §5): one line is read, its effects run to completion,
//! the result is printed, and only then is the next line read.

use std::io::{self, BufRead, IsTerminal, Write};

use synergy_core::Dispatcher;

use crate::args::{Cli, Config};
use crate::commands::{self, Flow};
use crate::session::SessionState;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_cli(cli);
    let mut state = SessionState::new();

    if let Some(name) = &config.model_override {
        if let Err(err) = state.registry.set_active(name) {
            eprintln!("ERROR: {err}");
        }
    }

    if !config.quiet {
        print_banner(&state);
    }

    let dispatcher = Dispatcher::new(config.transport.clone());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().ok();

        let Some(next) = lines.next() else { break };
        let Ok(line) = next else { break };

        if line.starts_with(',') {
            match commands::dispatch_meta(&line, &mut state, &config) {
                Flow::Continue => continue,
                Flow::Exit => break,
            }
        } else if line.trim().is_empty() {
            println!("WARNING: Ignoring empty assistant query");
        } else {
            let model = state.registry.get_active().clone();
            let result = dispatcher.ask(
                &model,
                &state.system_prompt,
                state.base64_to_assistant,
                &state.stack,
                &mut state.convo,
                &line,
            );
            match result {
                Ok(reply) => println!("{reply}"),
                Err(err) => println!("ERROR: {err}"),
            }
        }
    }

    let is_interactive = io::stdin().is_terminal();
    let force_autodump = synergy_common::env::env_flag(synergy_common::env::SYNERGY_FORCE_AUTODUMP);
    if is_interactive || force_autodump {
        autodump(&state, &config);
    }

    Ok(())
}

fn print_banner(state: &SessionState) {
    let cwd = std::env::current_dir().map(|p| p.display().to_string()).unwrap_or_else(|_| "?".to_string());
    println!("Synergy — model: {}, cwd: {cwd}", state.registry.active_shortname());
}

/// Writes a final dump to a freshly generated filename, distinct from any
/// explicit dump already written this session (spec §4.F "Autodump").
fn autodump(state: &SessionState, config: &Config) {
    let dir = config.paths.dumps_dir();
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("ERROR: {err}");
        return;
    }
    let path = dir.join(synergy_core::default_dump_filename(state.session_uuid));
    match synergy_core::dump_xml(
        &state.stack,
        &state.convo,
        state.registry.active_shortname(),
        state.session_uuid,
        &state.system_prompt,
    ) {
        Ok(xml) => {
            if let Err(err) = std::fs::write(&path, xml) {
                eprintln!("ERROR: {err}");
            }
        }
        Err(err) => eprintln!("ERROR: {err}"),
    }
}

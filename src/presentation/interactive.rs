//! Interactive command interpreter.
//!
//! Flags given when the process started stay in force for the whole session.
//! Flags typed at the prompt apply to that one command: the connection picked
//! with `-c` is popped again once the command finishes.

use crate::infrastructure::config::{DEBUG_KEY, VERBOSE_KEY};
use crate::presentation::cli::{GlobalFlags, SharedCommand};
use crate::presentation::session::Session;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::Path;
use tracing::debug;

pub const HISTORY_FILE: &str = ".hurlsh_history";

/// One line typed at the prompt.
#[derive(Parser, Debug)]
#[command(name = "hurlsh", no_binary_name = true, disable_version_flag = true)]
pub struct Line {
    #[command(flatten)]
    pub flags: GlobalFlags,

    #[command(subcommand)]
    pub command: LineCommand,
}

#[derive(Subcommand, Debug)]
pub enum LineCommand {
    /// Exit from the application
    #[command(alias = "quit")]
    Exit,

    /// Toggle verbose mode and print status
    #[command(alias = "v")]
    Verbose,

    /// Toggle debug mode and print status
    #[command(alias = "d")]
    Debug,

    /// Re-read the config file
    Reload,

    #[command(flatten)]
    Shared(SharedCommand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    Exit,
}

/// Reads and executes lines until end of input or `exit`.
pub async fn run(session: &mut Session) -> Result<()> {
    // Whatever the process flags selected is the durable connection from here on.
    session.end_command();

    let mut editor = DefaultEditor::new().context("Failed to start line editor")?;
    let history = Path::new(HISTORY_FILE);
    if let Err(err) = editor.load_history(history) {
        debug!("History load: {}", err);
    }

    loop {
        match editor.readline(&session.prompt()) {
            Ok(line) => {
                if let Err(err) = editor.add_history_entry(line.as_str()) {
                    debug!("History add: {}", err);
                }
                if let Err(err) = editor.save_history(history) {
                    debug!("History save: {}", err);
                }
                match execute_line(session, &line).await {
                    Ok(LineOutcome::Continue) => {}
                    Ok(LineOutcome::Exit) => {
                        println!("\nGoodbye and thank you.");
                        break;
                    }
                    Err(err) => eprintln!("{}", format!("Error: {:#}", err).red()),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Readline Error: {}", err).red());
                break;
            }
        }
    }
    Ok(())
}

/// Parses and runs one line, restoring the durable connection afterwards.
pub async fn execute_line(session: &mut Session, line: &str) -> Result<LineOutcome> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(LineOutcome::Continue);
    }

    let parsed = match Line::try_parse_from(words) {
        Ok(parsed) => parsed,
        Err(err) => {
            err.print()?;
            return Ok(LineOutcome::Continue);
        }
    };

    session.apply_line_flags(&parsed.flags);
    session.begin_command(parsed.flags.connection.clone());
    let result = run_line_command(session, parsed.command).await;
    session.end_command();
    result
}

async fn run_line_command(session: &mut Session, command: LineCommand) -> Result<LineOutcome> {
    match command {
        LineCommand::Exit => return Ok(LineOutcome::Exit),
        LineCommand::Verbose => {
            let on = session.toggle(VERBOSE_KEY);
            println!("Verbose is {}", on_off(on));
        }
        LineCommand::Debug => {
            let on = session.toggle(DEBUG_KEY);
            println!("Debug is {}", on_off(on));
        }
        LineCommand::Reload => session.reload_config(),
        LineCommand::Shared(command) => session.run(command).await?,
    }
    Ok(LineOutcome::Continue)
}

fn on_off(on: bool) -> &'static str {
    if on { "On" } else { "Off" }
}

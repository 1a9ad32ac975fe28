//! Line-oriented editing session.
//!
//! Each stdin line is one event, applied in order against a single open
//! board, so undo/redo work across lines.

use super::board::apply_command;
use super::CliContext;
use crate::cli::BoardCommand;
use crate::display;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum SessionCommand {
    #[command(flatten)]
    Board(BoardCommand),
    Undo,
    Redo,
    Show,
    #[command(alias = "exit")]
    Quit,
}

pub async fn run(context: &CliContext, board: &str) -> Result<()> {
    let mut session = context.open_board(board).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let words = match tokenize(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        let command = match SessionLine::try_parse_from(&words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        let outcome = match command {
            SessionCommand::Quit => break,
            SessionCommand::Undo => Ok(session.undo()),
            SessionCommand::Redo => Ok(session.redo()),
            SessionCommand::Show => {
                println!("{}", display::board(&session.resolved_snapshot()));
                continue;
            }
            SessionCommand::Board(command) => apply_command(context, &mut session, command).await,
        };
        match outcome {
            Ok(true) => {}
            Ok(false) => eprintln!("nothing changed"),
            Err(e) => eprintln!("Error: {e:#}"),
        }
    }

    session.close()?;
    Ok(())
}

/// Split a line on whitespace, keeping double-quoted runs together
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if quoted {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

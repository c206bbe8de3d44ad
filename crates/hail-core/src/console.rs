//! Interactive console for HITL agent sessions.
//!
//! REPL-style loop: one user line becomes one turn, streamed token-style
//! with a progress spinner, pausing for review whenever the engine asks.
//! Errors end the turn, never the console; the session key survives for
//! the next turn.

use std::io::{BufRead, Write};

use anyhow::Result;
use hail_types::SessionId;

use crate::core::signals::{self, InterruptedError};
use crate::core::spinner::Spinner;
use crate::core::turn::{self, ASSISTANT_PREFIX, TurnOutcome};
use crate::engine::AgentEngine;

const PROMPT_PREFIX: &str = "you> ";
/// Exit commands, case-insensitive; `退出` is the localized equivalent.
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "bye", "退出"];

/// Runs the interactive console loop.
///
/// Reads user input from `input`, writes responses to `output`. Exits on
/// an exit command or EOF.
pub async fn run_console<E, R, W>(
    engine: &E,
    session: &SessionId,
    input: R,
    output: &mut W,
) -> Result<()>
where
    E: AgentEngine,
    R: BufRead,
    W: Write,
{
    writeln!(output, "hail (type exit to quit)")?;
    writeln!(output, "session: {session}")?;
    write!(output, "{PROMPT_PREFIX}")?;
    output.flush()?;

    let mut input = input;
    let mut spinner = Spinner::new();

    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            writeln!(output, "Goodbye!")?;
            break;
        }
        let trimmed = line.trim();

        if trimmed.is_empty() {
            write!(output, "{PROMPT_PREFIX}")?;
            output.flush()?;
            continue;
        }

        if is_exit_command(trimmed) {
            writeln!(output, "Goodbye!")?;
            break;
        }

        match turn::run_turn(engine, session, trimmed, &mut input, output, &mut spinner).await {
            Ok(TurnOutcome::Completed { .. }) => {}
            Ok(TurnOutcome::NoOutput) => {
                writeln!(output, "{ASSISTANT_PREFIX}(no output)")?;
            }
            Err(e) => {
                if e.downcast_ref::<InterruptedError>().is_some() {
                    signals::reset();
                    writeln!(output, "^C Interrupted.")?;
                } else {
                    writeln!(output, "Error: {e:#}")?;
                }
            }
        }

        write!(output, "{PROMPT_PREFIX}")?;
        output.flush()?;
    }

    Ok(())
}

/// Runs a single turn (piped input mode).
///
/// There is no interactive reader behind the prompt, so a review request
/// cannot be answered: the gate sees a closed input and the turn fails
/// with a readable error.
pub async fn run_single_turn<E, W>(
    engine: &E,
    session: &SessionId,
    prompt: &str,
    output: &mut W,
) -> Result<TurnOutcome>
where
    E: AgentEngine,
    W: Write,
{
    let mut spinner = Spinner::new();
    let mut input = std::io::BufReader::new(std::io::empty());

    let outcome = turn::run_turn(engine, session, prompt, &mut input, output, &mut spinner).await?;
    if outcome == TurnOutcome::NoOutput {
        writeln!(output, "{ASSISTANT_PREFIX}(no output)")?;
    }
    Ok(outcome)
}

fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS.iter().any(|cmd| line.eq_ignore_ascii_case(cmd))
}

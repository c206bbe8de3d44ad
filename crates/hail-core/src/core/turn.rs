//! Turn orchestration: stream, pause for review, resume, repeat.

use std::io::{BufRead, Write};

use anyhow::Result;
use futures_util::StreamExt;
use hail_types::{Interrupt, SessionId, TurnInput};

use crate::core::emitter::StreamPrinter;
use crate::core::review;
use crate::core::signals::{self, InterruptedError};
use crate::core::spinner::Spinner;
use crate::engine::{AgentEngine, SnapshotStream};

/// Label written ahead of the first streamed output of each stream.
pub const ASSISTANT_PREFIX: &str = "assistant> ";

/// How a settled turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn completed; `text` is everything that was streamed out.
    Completed { text: String },
    /// The turn completed without producing any output.
    NoOutput,
}

/// Phase of the turn state machine.
enum TurnPhase {
    Streaming(TurnInput),
    Reviewing(Interrupt),
    Done(TurnOutcome),
}

/// What one consumed stream ended with.
enum StreamEnd {
    Finished,
    Paused(Interrupt),
}

/// Runs one logical user turn against the engine.
///
/// Drives an explicit phase loop: each streaming phase consumes snapshots
/// until the stream ends or pauses; each pause runs the review gate and
/// feeds the resulting resume command into a new stream opened with the
/// same session key. Review cycles are unbounded.
///
/// The spinner is stopped on every exit path, including errors, strictly
/// before anything else is written.
pub async fn run_turn<E, R, W>(
    engine: &E,
    session: &SessionId,
    prompt: &str,
    input: &mut R,
    output: &mut W,
    spinner: &mut Spinner,
) -> Result<TurnOutcome>
where
    E: AgentEngine,
    R: BufRead,
    W: Write,
{
    let mut phase = TurnPhase::Streaming(TurnInput::message(prompt));
    let mut transcript = String::new();

    loop {
        phase = match phase {
            TurnPhase::Streaming(turn_input) => {
                spinner.start();
                let result =
                    stream_once(engine, session, turn_input, output, spinner, &mut transcript)
                        .await;
                // Covers the pause and error paths; the happy path already
                // stopped it before the first write.
                spinner.stop().await;

                match result? {
                    StreamEnd::Paused(interrupt) => TurnPhase::Reviewing(interrupt),
                    StreamEnd::Finished => TurnPhase::Done(if transcript.is_empty() {
                        TurnOutcome::NoOutput
                    } else {
                        TurnOutcome::Completed {
                            text: std::mem::take(&mut transcript),
                        }
                    }),
                }
            }
            TurnPhase::Reviewing(interrupt) => {
                writeln!(output)?;
                writeln!(
                    output,
                    "[review] the agent paused for approval of {} action(s)",
                    interrupt.pending_actions.len()
                )?;
                let resume = review::collect_decisions(&interrupt, input, output)?;
                TurnPhase::Streaming(TurnInput::Resume(resume))
            }
            TurnPhase::Done(outcome) => return Ok(outcome),
        };
    }
}

/// Opens and fully consumes one stream.
///
/// Emitted text is appended to `transcript`; a trailing newline goes out
/// whenever the stream printed anything, whether it finished, paused, or
/// failed.
async fn stream_once<E, W>(
    engine: &E,
    session: &SessionId,
    input: TurnInput,
    output: &mut W,
    spinner: &mut Spinner,
    transcript: &mut String,
) -> Result<StreamEnd>
where
    E: AgentEngine,
    W: Write,
{
    let mut stream = engine.open_stream(session, input).await?;
    let mut printer = StreamPrinter::new(output, ASSISTANT_PREFIX);

    let result = consume_stream(&mut stream, &mut printer, spinner).await;

    printer.finish()?;
    transcript.push_str(printer.emitted());
    result
}

async fn consume_stream<W: Write>(
    stream: &mut SnapshotStream,
    printer: &mut StreamPrinter<'_, W>,
    spinner: &mut Spinner,
) -> Result<StreamEnd> {
    while let Some(item) = stream.next().await {
        if signals::is_interrupted() {
            return Err(InterruptedError.into());
        }

        let snapshot = item?;

        // The pause check wins over content on the same snapshot; content
        // arriving alongside an interrupt is not flushed.
        if let Some(interrupt) = snapshot.pending_interrupt() {
            tracing::debug!(
                actions = interrupt.pending_actions.len(),
                "stream paused for review"
            );
            return Ok(StreamEnd::Paused(interrupt.clone()));
        }

        let full_text = snapshot.full_text();
        if printer.delta(&full_text).is_some() {
            spinner.stop().await;
            printer.emit(&full_text)?;
        }
    }

    Ok(StreamEnd::Finished)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, VecDeque};
    use std::io::Cursor;
    use std::sync::Mutex;

    use futures_util::stream;
    use hail_types::{ActionRequest, DecisionKind, ReviewPolicy, Snapshot};
    use serde_json::json;

    use super::*;
    use crate::engine::{EngineError, EngineResult};

    /// Engine fed from scripted snapshot sequences, one per `open_stream`.
    struct ScriptedEngine {
        scripts: Mutex<VecDeque<Vec<EngineResult<Snapshot>>>>,
        calls: Mutex<Vec<(SessionId, TurnInput)>>,
    }

    impl ScriptedEngine {
        fn new(scripts: Vec<Vec<EngineResult<Snapshot>>>) -> Self {
            Self {
                scripts: Mutex::new(scripts.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(SessionId, TurnInput)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AgentEngine for ScriptedEngine {
        async fn open_stream(
            &self,
            session: &SessionId,
            input: TurnInput,
        ) -> Result<SnapshotStream> {
            self.calls.lock().unwrap().push((session.clone(), input));
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted stream left");
            Ok(stream::iter(script).boxed())
        }
    }

    fn sql_interrupt() -> Interrupt {
        Interrupt {
            pending_actions: vec![ActionRequest {
                name: "sql_db_query".to_string(),
                args: json!({"query": "SELECT * FROM X"}),
                review_policy: "sql_db_query".to_string(),
            }],
            review_policies: HashMap::from([(
                "sql_db_query".to_string(),
                ReviewPolicy {
                    allowed_decisions: vec![DecisionKind::Approve, DecisionKind::Reject],
                },
            )]),
        }
    }

    async fn run(
        engine: &ScriptedEngine,
        review_input: &str,
    ) -> (Result<TurnOutcome>, String) {
        let session = SessionId::from("session-1");
        let mut input = Cursor::new(review_input.as_bytes().to_vec());
        let mut output = Vec::new();
        let mut spinner = Spinner::new();

        let result = run_turn(
            engine,
            &session,
            "hello",
            &mut input,
            &mut output,
            &mut spinner,
        )
        .await;
        assert!(!spinner.is_running());

        (result, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_streams_growing_snapshots_once() {
        let engine = ScriptedEngine::new(vec![vec![
            Ok(Snapshot::text("H")),
            Ok(Snapshot::text("He")),
            Ok(Snapshot::text("Hello")),
        ]]);

        let (result, rendered) = run(&engine, "").await;
        assert_eq!(
            result.unwrap(),
            TurnOutcome::Completed {
                text: "Hello".to_string()
            }
        );
        assert_eq!(rendered, "assistant> Hello\n");
    }

    #[tokio::test]
    async fn test_tolerates_non_extending_snapshots() {
        let engine = ScriptedEngine::new(vec![vec![
            Ok(Snapshot::text("Hello")),
            Ok(Snapshot::text("He")),
            Ok(Snapshot::text("Hello")),
            Ok(Snapshot::text("Hello world")),
        ]]);

        let (result, rendered) = run(&engine, "").await;
        assert_eq!(
            result.unwrap(),
            TurnOutcome::Completed {
                text: "Hello world".to_string()
            }
        );
        assert_eq!(rendered, "assistant> Hello world\n");
    }

    #[tokio::test]
    async fn test_interrupt_short_circuits_content() {
        let mut paused = Snapshot::text("should not print");
        paused.interrupt = Some(sql_interrupt());

        let engine = ScriptedEngine::new(vec![
            vec![
                Ok(Snapshot::text("Running query")),
                Ok(paused),
                Ok(Snapshot::text("also not printed")),
            ],
            vec![Ok(Snapshot::text("Done."))],
        ]);

        let (result, rendered) = run(&engine, "a\n").await;
        assert_eq!(
            result.unwrap(),
            TurnOutcome::Completed {
                text: "Running queryDone.".to_string()
            }
        );
        assert!(rendered.contains("assistant> Running query\n"));
        assert!(rendered.contains("assistant> Done.\n"));
        assert!(!rendered.contains("not print"));
        assert!(rendered.contains("[review]"));
    }

    #[tokio::test]
    async fn test_resume_reuses_session_and_carries_decisions() {
        let engine = ScriptedEngine::new(vec![
            vec![Ok(Snapshot::interrupted(sql_interrupt()))],
            vec![Ok(Snapshot::text("ok"))],
        ]);

        let (result, _) = run(&engine, "approve\n").await;
        result.unwrap();

        let calls = engine.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, calls[1].0);
        assert_eq!(calls[0].1, TurnInput::message("hello"));

        let TurnInput::Resume(resume) = &calls[1].1 else {
            panic!("second stream should be a resume");
        };
        assert_eq!(resume.decisions.len(), 1);
        assert_eq!(resume.decisions[0].kind, DecisionKind::Approve);
    }

    #[tokio::test]
    async fn test_multiple_review_cycles_in_one_turn() {
        let engine = ScriptedEngine::new(vec![
            vec![Ok(Snapshot::interrupted(sql_interrupt()))],
            vec![Ok(Snapshot::interrupted(sql_interrupt()))],
            vec![Ok(Snapshot::text("finally"))],
        ]);

        let (result, _) = run(&engine, "a\nr\n").await;
        assert_eq!(
            result.unwrap(),
            TurnOutcome::Completed {
                text: "finally".to_string()
            }
        );

        let calls = engine.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(session, _)| session == &calls[0].0));
        let TurnInput::Resume(second) = &calls[2].1 else {
            panic!("third stream should be a resume");
        };
        assert_eq!(second.decisions[0].kind, DecisionKind::Reject);
    }

    #[tokio::test]
    async fn test_empty_interrupt_is_treated_as_completion() {
        let engine = ScriptedEngine::new(vec![vec![
            Ok(Snapshot::text("fine")),
            Ok(Snapshot {
                content: None,
                interrupt: Some(Interrupt::default()),
            }),
        ]]);

        let (result, _) = run(&engine, "").await;
        assert_eq!(
            result.unwrap(),
            TurnOutcome::Completed {
                text: "fine".to_string()
            }
        );
        assert_eq!(engine.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_mute_turn_reports_no_output() {
        let engine = ScriptedEngine::new(vec![vec![Ok(Snapshot::default())]]);

        let (result, rendered) = run(&engine, "").await;
        assert_eq!(result.unwrap(), TurnOutcome::NoOutput);
        assert_eq!(rendered, "");
    }

    #[tokio::test]
    async fn test_stream_error_abandons_turn() {
        let engine = ScriptedEngine::new(vec![vec![
            Ok(Snapshot::text("partial")),
            Err(EngineError::api_error("overloaded", "busy")),
        ]]);

        let (result, rendered) = run(&engine, "").await;
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<EngineError>().is_some());
        // Partial output still ends with a newline before the error is
        // reported upstream.
        assert_eq!(rendered, "assistant> partial\n");
    }
}

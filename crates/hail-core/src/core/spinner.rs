//! Progress indicator for in-flight engine work.
//!
//! A single background task renders frames to stderr while the primary
//! flow waits on the engine. The contract is ordering, not locking: the
//! spinner is always stopped synchronously before anything else writes,
//! so the two flows never interleave output.

use std::io::{Write, stderr};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

/// Spinner frames for the progress animation.
const FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
/// Delay between frames (10 frames per second).
const FRAME_INTERVAL: Duration = Duration::from_millis(100);
/// Bound on how long `stop` waits for the render task to quiesce.
const STOP_GRACE: Duration = Duration::from_millis(250);
const MESSAGE: &str = "thinking";

/// Cancellable progress animation.
///
/// `start` and `stop` are both idempotent. Rendering is best-effort: write
/// failures are swallowed and never surface to the caller.
pub struct Spinner {
    running: Option<RenderTask>,
}

struct RenderTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Spinner {
    pub fn new() -> Self {
        Self { running: None }
    }

    /// Returns whether the render task is active.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Begins rendering. No-op while already running.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let render_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut frame = 0usize;
            loop {
                let glyph = FRAMES[frame % FRAMES.len()];
                let mut err = stderr();
                let _ = write!(err, "\r{glyph} {MESSAGE}...");
                let _ = err.flush();
                frame += 1;

                tokio::select! {
                    () = render_cancel.cancelled() => break,
                    () = sleep(FRAME_INTERVAL) => {}
                }
            }
        });

        self.running = Some(RenderTask { cancel, handle });
    }

    /// Halts rendering and erases the line. No-op while already stopped.
    ///
    /// Waits a bounded grace period for the render task to finish; a task
    /// that fails to quiesce in time is aborted and the line erased anyway
    /// (a visual glitch is acceptable, hanging is not).
    pub async fn stop(&mut self) {
        let Some(mut task) = self.running.take() else {
            return;
        };

        task.cancel.cancel();
        if timeout(STOP_GRACE, &mut task.handle).await.is_err() {
            task.handle.abort();
        }

        let mut err = stderr();
        let _ = write!(err, "\r{}\r", " ".repeat(MESSAGE.len() + 8));
        let _ = err.flush();
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(task) = &self.running {
            task.cancel.cancel();
        }
    }
}

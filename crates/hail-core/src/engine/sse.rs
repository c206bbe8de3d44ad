//! SSE wire format for engine snapshot streams.
//!
//! A stream response is `text/event-stream` carrying:
//! - `snapshot` events whose data is a JSON [`Snapshot`]
//! - `ping` keepalives (no data)
//! - `error` events whose data is `{"type": …, "message": …}`

use std::pin::Pin;
use std::task::{Context, Poll};

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;
use hail_types::Snapshot;
use serde::Deserialize;

use super::{EngineError, EngineResult};

/// SSE parser that converts a byte stream into snapshots.
pub struct SnapshotSseParser<S> {
    inner: EventStream<S>,
}

impl<S> SnapshotSseParser<S> {
    pub fn new(stream: S) -> Self
    where
        S: Eventsource,
    {
        Self {
            inner: stream.eventsource(),
        }
    }
}

impl<S, E> Stream for SnapshotSseParser<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = EngineResult<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    // Keepalives produce no item; poll the inner stream again.
                    if let Some(item) = parse_sse_event(&event.event, &event.data) {
                        return Poll::Ready(Some(item));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(EngineError::parse(format!(
                        "SSE stream error: {e}"
                    )))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SseErrorEvent {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Parses a single SSE event. Returns `None` for keepalives.
fn parse_sse_event(event_type: &str, data: &str) -> Option<EngineResult<Snapshot>> {
    match event_type {
        "ping" => None,
        // "message" is the default when the server omits the event field.
        "snapshot" | "message" => Some(parse_snapshot(data)),
        "error" => Some(Err(parse_error(data))),
        other => Some(Err(EngineError::parse(format!(
            "Unknown stream event: {other}"
        )))),
    }
}

fn parse_snapshot(data: &str) -> EngineResult<Snapshot> {
    serde_json::from_str(data)
        .map_err(|err| EngineError::parse(format!("Failed to parse snapshot: {err}")))
}

fn parse_error(data: &str) -> EngineError {
    match serde_json::from_str::<SseErrorEvent>(data) {
        Ok(event) => EngineError::api_error(&event.error_type, &event.message),
        Err(_) => EngineError::api_error("unknown", data),
    }
}

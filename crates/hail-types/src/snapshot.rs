//! Snapshots: cumulative views of a streaming turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::review::Interrupt;

/// A point-in-time view of the turn produced by the agent engine.
///
/// Snapshots are cumulative: each one carries the full message content so
/// far, not a delta. The final snapshot of a paused stream additionally
/// carries the interrupt that caused the pause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Latest message content, if the snapshot carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<SnapshotContent>,
    /// Pause request, present only on the final snapshot of a paused stream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt: Option<Interrupt>,
}

impl Snapshot {
    /// Creates a snapshot carrying plain text content.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(SnapshotContent::Text(content.into())),
            interrupt: None,
        }
    }

    /// Creates a content-free snapshot carrying an interrupt.
    pub fn interrupted(interrupt: Interrupt) -> Self {
        Self {
            content: None,
            interrupt: Some(interrupt),
        }
    }

    /// Normalizes the content to a single flat string.
    ///
    /// This is the only place content shape is branched on: plain text is
    /// taken as-is, fragment lists are concatenated in order. Absent
    /// content flattens to the empty string.
    pub fn full_text(&self) -> String {
        self.content
            .as_ref()
            .map(SnapshotContent::flatten)
            .unwrap_or_default()
    }

    /// Returns the interrupt if this snapshot pauses the stream.
    ///
    /// An interrupt with no pending actions is malformed and treated as no
    /// interrupt at all.
    pub fn pending_interrupt(&self) -> Option<&Interrupt> {
        self.interrupt
            .as_ref()
            .filter(|interrupt| !interrupt.pending_actions.is_empty())
    }
}

/// Message content - either simple text or an ordered list of fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotContent {
    Text(String),
    Fragments(Vec<Fragment>),
}

impl SnapshotContent {
    /// Flattens the content to a single string.
    pub fn flatten(&self) -> String {
        match self {
            SnapshotContent::Text(text) => text.clone(),
            SnapshotContent::Fragments(fragments) => {
                fragments.iter().map(Fragment::render).collect()
            }
        }
    }
}

/// One element of a fragmented message body.
///
/// Fragments with a string `text` field contribute that text; every other
/// shape is opaque and rendered by its JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Text { text: String },
    Other(Value),
}

impl Fragment {
    fn render(&self) -> String {
        match self {
            Fragment::Text { text } => text.clone(),
            Fragment::Other(value) => value.to_string(),
        }
    }
}

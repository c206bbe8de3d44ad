//! Interrupt payloads, review policies, and the resume protocol.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A pause request from the agent engine.
///
/// Carries the actions awaiting human review plus the policies describing
/// which decisions each action admits. Consumed exactly once by the review
/// gate; never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interrupt {
    /// Actions awaiting review, in the order the engine wants them decided.
    pub pending_actions: Vec<ActionRequest>,
    /// Review policies keyed by action name.
    #[serde(default)]
    pub review_policies: HashMap<String, ReviewPolicy>,
}

impl Interrupt {
    /// Resolves the policy for an action name.
    ///
    /// Actions without an explicit policy fall back to the default policy,
    /// which allows every decision kind.
    pub fn policy_for(&self, action: &str) -> ReviewPolicy {
        self.review_policies.get(action).cloned().unwrap_or_default()
    }
}

/// One action the engine wants approved before executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Action (tool) name.
    pub name: String,
    /// Structured arguments the action would run with.
    #[serde(default)]
    pub args: Value,
    /// Name of the review policy governing this action.
    pub review_policy: String,
}

/// Decision vocabulary allowed for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPolicy {
    pub allowed_decisions: Vec<DecisionKind>,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            allowed_decisions: vec![DecisionKind::Approve, DecisionKind::Edit, DecisionKind::Reject],
        }
    }
}

impl ReviewPolicy {
    /// Returns whether the policy admits the given decision kind.
    pub fn allows(&self, kind: DecisionKind) -> bool {
        self.allowed_decisions.contains(&kind)
    }
}

/// A kind of review decision.
///
/// `Edit` appears in engine-supplied policies but is not collectable at the
/// review gate; only `Approve` and `Reject` are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Approve,
    Edit,
    Reject,
}

impl DecisionKind {
    pub fn label(self) -> &'static str {
        match self {
            DecisionKind::Approve => "approve",
            DecisionKind::Edit => "edit",
            DecisionKind::Reject => "reject",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One decision for one pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "type")]
    pub kind: DecisionKind,
}

impl Decision {
    pub fn approve() -> Self {
        Self {
            kind: DecisionKind::Approve,
        }
    }

    pub fn reject() -> Self {
        Self {
            kind: DecisionKind::Reject,
        }
    }
}

/// Continues a paused session from the point of its interrupt.
///
/// Decisions are ordered to match the `pending_actions` of the interrupt
/// being answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeCommand {
    pub decisions: Vec<Decision>,
}

impl ResumeCommand {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self { decisions }
    }
}

/// Input that opens a stream: a fresh user message or a resume command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnInput {
    Message(String),
    Resume(ResumeCommand),
}

impl TurnInput {
    pub fn message(content: impl Into<String>) -> Self {
        TurnInput::Message(content.into())
    }
}

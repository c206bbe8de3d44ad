//! Wire and domain types for the agent-engine boundary.
//!
//! Everything the engine sends (snapshots, interrupts, review policies) and
//! everything the client sends back (turn inputs, resume commands) lives
//! here, serializable in both directions.

mod review;
mod session;
mod snapshot;

pub use review::{
    ActionRequest, Decision, DecisionKind, Interrupt, ResumeCommand, ReviewPolicy, TurnInput,
};
pub use session::SessionId;
pub use snapshot::{Fragment, Snapshot, SnapshotContent};

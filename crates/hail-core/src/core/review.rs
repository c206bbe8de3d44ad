//! Human review gate.
//!
//! Presents the pending actions of an interrupt on the console and blocks
//! until a valid decision is entered for each one. The gate performs
//! synchronous line-oriented input, so the spinner must already be stopped
//! when it runs.

use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use hail_types::{Decision, DecisionKind, Interrupt, ResumeCommand, ReviewPolicy};

/// Collects one decision per pending action, in input order.
///
/// Invalid input re-prompts without consuming an action slot; a closed
/// input aborts the turn.
pub fn collect_decisions<R: BufRead, W: Write>(
    interrupt: &Interrupt,
    input: &mut R,
    output: &mut W,
) -> Result<ResumeCommand> {
    let mut decisions = Vec::with_capacity(interrupt.pending_actions.len());

    for (index, action) in interrupt.pending_actions.iter().enumerate() {
        let policy = interrupt.policy_for(&action.name);

        writeln!(output)?;
        writeln!(output, "[{}] action: {}", index + 1, action.name)?;
        writeln!(output, "    args: {}", action.args)?;
        writeln!(output, "    allowed: {}", decision_list(&policy.allowed_decisions))?;

        decisions.push(prompt_decision(&policy, input, output)?);
    }

    tracing::debug!(count = decisions.len(), "review decisions collected");
    Ok(ResumeCommand::new(decisions))
}

fn prompt_decision<R: BufRead, W: Write>(
    policy: &ReviewPolicy,
    input: &mut R,
    output: &mut W,
) -> Result<Decision> {
    let usable = usable_kinds(policy);

    loop {
        write!(output, "    decide ({}): ", prompt_options(&usable))?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed during review");
        }

        match parse_decision(line.trim()) {
            Some(kind) if usable.contains(&kind) => return Ok(Decision { kind }),
            _ => writeln!(output, "    please answer one of: {}", decision_list(&usable))?,
        }
    }
}

/// The decision kinds the gate can actually collect for this policy.
///
/// `edit` is policy-expressible but not collectable. A policy that leaves
/// no collectable kind would deadlock the prompt, so it falls back to the
/// full collectable vocabulary.
fn usable_kinds(policy: &ReviewPolicy) -> Vec<DecisionKind> {
    let usable: Vec<DecisionKind> = [DecisionKind::Approve, DecisionKind::Reject]
        .into_iter()
        .filter(|&kind| policy.allows(kind))
        .collect();

    if usable.is_empty() {
        tracing::warn!("review policy admits no collectable decision; allowing approve/reject");
        vec![DecisionKind::Approve, DecisionKind::Reject]
    } else {
        usable
    }
}

/// Maps an input token to a decision kind.
fn parse_decision(token: &str) -> Option<DecisionKind> {
    match token.to_lowercase().as_str() {
        "a" | "approve" => Some(DecisionKind::Approve),
        "r" | "reject" => Some(DecisionKind::Reject),
        _ => None,
    }
}

fn prompt_options(kinds: &[DecisionKind]) -> String {
    kinds
        .iter()
        .map(|kind| match kind {
            DecisionKind::Approve => "[a]pprove",
            DecisionKind::Reject => "[r]eject",
            DecisionKind::Edit => "edit",
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

fn decision_list(kinds: &[DecisionKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

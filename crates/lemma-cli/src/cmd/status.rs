//! `lm status`, `lm show` — read-only views of the proof tree.

use crate::cmd::{Ctx, parse_node_id};
use crate::output::{pretty_kv, pretty_rule, render};
use clap::Args;
use lemma_core::model::challenge::Challenge;
use lemma_core::model::node::Node;
use serde::Serialize;
use std::io::Write;

/// Arguments for `lm status`.
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Arguments for `lm show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Node id to show.
    pub node: String,
}

#[derive(Debug, Serialize)]
struct NodeRow {
    id: String,
    epistemic: String,
    workflow: String,
    taint: String,
    claimed_by: Option<String>,
    statement: String,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    conjecture: String,
    author: String,
    nodes: Vec<NodeRow>,
    open_challenges: usize,
}

#[derive(Debug, Serialize)]
struct ShowOutput {
    node: Node,
    children: Vec<String>,
    challenges: Vec<Challenge>,
}

fn row(node: &Node) -> NodeRow {
    NodeRow {
        id: node.id.to_string(),
        epistemic: node.epistemic.to_string(),
        workflow: node.workflow.to_string(),
        taint: node.taint.to_string(),
        claimed_by: node.claimed_by.clone(),
        statement: node.statement.clone(),
    }
}

/// Execute `lm status`.
pub fn run_status(_args: &StatusArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let wb = ctx.workbench()?;
    let state = wb.load_state()?;
    let meta = state.meta().cloned();

    let payload = StatusOutput {
        conjecture: meta.as_ref().map(|m| m.conjecture.clone()).unwrap_or_default(),
        author: meta.map(|m| m.author).unwrap_or_default(),
        nodes: state.nodes().map(row).collect(),
        open_challenges: state.open_challenges().len(),
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(w, "Conjecture: {}", out.conjecture)?;
        pretty_rule(w)?;
        for node in &out.nodes {
            let indent = "  ".repeat(node.id.matches('.').count());
            let held = node
                .claimed_by
                .as_deref()
                .map(|owner| format!(" [{owner}]"))
                .unwrap_or_default();
            writeln!(
                w,
                "{indent}{}  {} / {}{held}  {}",
                node.id, node.epistemic, node.taint, node.statement
            )?;
        }
        pretty_rule(w)?;
        writeln!(w, "{} open challenges", out.open_challenges)
    })
}

/// Execute `lm show`.
pub fn run_show(args: &ShowArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    let wb = ctx.workbench()?;
    let state = wb.load_state()?;
    let node = state
        .node(&node_id)
        .ok_or_else(|| lemma_core::error::StructuralError::NodeNotFound {
            node_id: node_id.clone(),
        })
        .map_err(lemma_core::LemmaError::from)?;

    let payload = ShowOutput {
        node: node.clone(),
        children: state
            .children_of(&node_id)
            .iter()
            .map(|n| n.id.to_string())
            .collect(),
        challenges: state
            .challenges_for(&node_id)
            .into_iter()
            .cloned()
            .collect(),
    };
    render(ctx.mode, &payload, render_show)
}

fn render_show(out: &ShowOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Node {}", out.node.id)?;
    pretty_kv(w, "statement", &out.node.statement)?;
    pretty_kv(w, "kind", out.node.kind.to_string())?;
    pretty_kv(w, "inference", out.node.inference.to_string())?;
    pretty_kv(w, "epistemic", out.node.epistemic.to_string())?;
    pretty_kv(w, "workflow", out.node.workflow.to_string())?;
    pretty_kv(w, "taint", out.node.taint.to_string())?;
    if let Some(owner) = &out.node.claimed_by {
        pretty_kv(w, "claimed by", owner)?;
    }
    if let Some(deadline) = out.node.claim_deadline {
        pretty_kv(w, "deadline", deadline.to_rfc3339())?;
    }
    if !out.children.is_empty() {
        pretty_kv(w, "children", out.children.join(", "))?;
    }
    for challenge in &out.challenges {
        writeln!(
            w,
            "  challenge {} [{}] {}: {}",
            challenge.id, challenge.status, challenge.target, challenge.reason
        )?;
    }
    Ok(())
}

//! `lm refine` — add a sub-claim under a claimed parent.

use crate::cmd::{Ctx, non_empty, parse_node_id};
use crate::output::{pretty_kv, render};
use clap::Args;
use lemma_core::error::InputError;
use lemma_core::model::node::{Inference, NodeKind};
use serde::Serialize;

/// Arguments for `lm refine`.
#[derive(Args, Debug)]
pub struct RefineArgs {
    /// The claimed parent node id.
    pub parent: String,

    /// Statement of the new sub-claim.
    #[arg(long, short)]
    pub statement: String,

    /// Inference rule deriving the sub-claim (e.g. `assumption`,
    /// `modus_ponens`, `induction`, or any domain-specific rule name).
    #[arg(long, short, default_value = "assumption")]
    pub inference: String,

    /// Node kind: `claim` or `lemma_ref`.
    #[arg(long, default_value = "claim")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
struct RefineOutput {
    node_id: String,
    parent: String,
    statement: String,
    inference: String,
}

/// Execute `lm refine`.
pub fn run(args: &RefineArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let parent = parse_node_id(&args.parent)?;
    non_empty(&args.statement, "statement")?;
    // Inference parsing is infallible: unknown names become domain rules.
    let inference = match args.inference.parse::<Inference>() {
        Ok(inference) => inference,
        Err(never) => match never {},
    };
    let kind = parse_kind(&args.kind).map_err(lemma_core::LemmaError::from)?;

    let wb = ctx.workbench()?;
    let node_id = wb.refine(&parent, &args.statement, inference.clone(), &ctx.agent, kind)?;

    let payload = RefineOutput {
        node_id: node_id.to_string(),
        parent: parent.to_string(),
        statement: args.statement.clone(),
        inference: inference.to_string(),
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(w, "Created {}", out.node_id)?;
        pretty_kv(w, "statement", &out.statement)?;
        pretty_kv(w, "inference", &out.inference)
    })
}

fn parse_kind(raw: &str) -> Result<NodeKind, InputError> {
    match raw {
        "claim" => Ok(NodeKind::Claim),
        "lemma_ref" => Ok(NodeKind::LemmaRef),
        _ => Err(InputError::InvalidFormat {
            what: "node kind",
            raw: raw.to_string(),
            reason: "expected 'claim' or 'lemma_ref'".to_string(),
        }),
    }
}

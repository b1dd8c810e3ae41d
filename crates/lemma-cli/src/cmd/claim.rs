//! `lm claim`, `lm release`, `lm reap` — node ownership lifecycle.

use crate::cmd::{Ctx, parse_node_ids};
use crate::output::render;
use chrono::Utc;
use clap::Args;
use lemma_core::model::node_id::NodeId;
use serde::Serialize;

/// Arguments for `lm claim`.
#[derive(Args, Debug)]
pub struct ClaimArgs {
    /// Node ids to claim (e.g. `1.2 1.3`).
    #[arg(required = true)]
    pub nodes: Vec<String>,

    /// Claim timeout in seconds (default from config, normally 1h).
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for `lm release`.
#[derive(Args, Debug)]
pub struct ReleaseArgs {
    /// Node ids to release.
    #[arg(required = true)]
    pub nodes: Vec<String>,
}

/// Arguments for `lm reap`.
#[derive(Args, Debug)]
pub struct ReapArgs {}

#[derive(Debug, Serialize)]
struct ClaimOutput {
    node_ids: Vec<NodeId>,
    owner: String,
    expires_at: String,
}

#[derive(Debug, Serialize)]
struct ReleaseOutput {
    released: Vec<NodeId>,
}

#[derive(Debug, Serialize)]
struct ReapOutput {
    reaped: Vec<NodeId>,
}

/// Execute `lm claim`.
pub fn run_claim(args: &ClaimArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_ids = parse_node_ids(&args.nodes)?;
    let wb = ctx.workbench()?;
    let receipt = wb.claim(&node_ids, &ctx.agent, args.timeout)?;

    let payload = ClaimOutput {
        node_ids: receipt.node_ids,
        owner: receipt.owner,
        expires_at: receipt.expires_at.to_rfc3339(),
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(
            w,
            "Claimed {} for {} until {}",
            join(&out.node_ids),
            out.owner,
            out.expires_at
        )
    })
}

/// Execute `lm release`.
pub fn run_release(args: &ReleaseArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_ids = parse_node_ids(&args.nodes)?;
    let wb = ctx.workbench()?;
    let released = wb.release(&node_ids, &ctx.agent)?;

    let payload = ReleaseOutput { released };
    render(ctx.mode, &payload, |out, w| {
        if out.released.is_empty() {
            writeln!(w, "Nothing to release.")
        } else {
            writeln!(w, "Released {}", join(&out.released))
        }
    })
}

/// Execute `lm reap`.
pub fn run_reap(_args: &ReapArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let wb = ctx.workbench()?;
    let reaped = wb.reap_expired_locks(Utc::now())?;

    let payload = ReapOutput { reaped };
    render(ctx.mode, &payload, |out, w| {
        if out.reaped.is_empty() {
            writeln!(w, "No expired claims.")
        } else {
            writeln!(w, "Reaped expired claims on {}", join(&out.reaped))
        }
    })
}

fn join(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Epistemic verdicts: `lm accept`, `lm admit`, `lm refute`, `lm archive`,
//! `lm rework`.

use crate::cmd::{Ctx, non_empty, parse_node_id};
use crate::output::render;
use clap::Args;
use serde::Serialize;

/// Arguments for `lm accept`.
#[derive(Args, Debug)]
pub struct AcceptArgs {
    /// Node id to validate.
    pub node: String,
}

/// Arguments for `lm admit`.
#[derive(Args, Debug)]
pub struct AdmitArgs {
    /// Node id to admit without verification.
    pub node: String,
}

/// Arguments for `lm refute`.
#[derive(Args, Debug)]
pub struct RefuteArgs {
    /// Node id to refute.
    pub node: String,

    /// Why the claim fails (e.g. a counterexample).
    #[arg(long)]
    pub reason: Option<String>,
}

/// Arguments for `lm archive`.
#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Node id to archive.
    pub node: String,
}

/// Arguments for `lm rework` (request refinement).
#[derive(Args, Debug)]
pub struct ReworkArgs {
    /// Validated node id to send back for refinement.
    pub node: String,

    /// Why the node needs more work.
    #[arg(long, short)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
struct VerdictOutput {
    node_id: String,
    epistemic: &'static str,
}

fn render_verdict(ctx: &Ctx, node_id: &str, epistemic: &'static str) -> anyhow::Result<()> {
    let payload = VerdictOutput {
        node_id: node_id.to_string(),
        epistemic,
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(w, "{} is now {}", out.node_id, out.epistemic)
    })
}

/// Execute `lm accept`.
pub fn run_accept(args: &AcceptArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    ctx.workbench()?.accept(&node_id)?;
    render_verdict(ctx, &args.node, "validated")
}

/// Execute `lm admit`.
pub fn run_admit(args: &AdmitArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    ctx.workbench()?.admit(&node_id)?;
    render_verdict(ctx, &args.node, "admitted")
}

/// Execute `lm refute`.
pub fn run_refute(args: &RefuteArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    ctx.workbench()?.refute(&node_id, args.reason.clone())?;
    render_verdict(ctx, &args.node, "refuted")
}

/// Execute `lm archive`.
pub fn run_archive(args: &ArchiveArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    ctx.workbench()?.archive(&node_id)?;
    render_verdict(ctx, &args.node, "archived")
}

/// Execute `lm rework`.
pub fn run_rework(args: &ReworkArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    non_empty(&args.reason, "reason")?;
    ctx.workbench()?
        .request_refinement(&node_id, &args.reason, &ctx.agent)?;
    render_verdict(ctx, &args.node, "needs_refinement")
}

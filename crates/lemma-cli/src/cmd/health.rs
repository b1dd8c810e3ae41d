//! `lm health` — proof progress dashboard.

use crate::cmd::Ctx;
use crate::output::{pretty_rule, render};
use clap::Args;
use lemma_core::health::{HealthReport, HealthStatus};
use std::io::Write;

/// Arguments for `lm health`.
#[derive(Args, Debug)]
pub struct HealthArgs {}

/// Execute `lm health`.
pub fn run(_args: &HealthArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let wb = ctx.workbench()?;
    let report = wb.health()?;
    render(ctx.mode, &report, render_report)
}

fn render_report(report: &HealthReport, w: &mut dyn Write) -> std::io::Result<()> {
    let marker = match report.status {
        HealthStatus::Healthy => "✓",
        HealthStatus::Warning => "◐",
        HealthStatus::Stuck => "⚠",
    };
    writeln!(w, "{marker} proof is {}", report.status)?;

    for blocker in &report.blockers {
        writeln!(w, "  blocker: {}", blocker.message)?;
        writeln!(w, "    fix: {}", blocker.suggestion)?;
        if !blocker.node_ids.is_empty() {
            let ids: Vec<String> = blocker.node_ids.iter().map(ToString::to_string).collect();
            writeln!(w, "    nodes: {}", ids.join(", "))?;
        }
    }

    pretty_rule(w)?;
    let s = &report.stats;
    writeln!(
        w,
        "pending {} / validated {} / admitted {} / refuted {} / archived {} / needs_refinement {}",
        s.pending, s.validated, s.admitted, s.refuted, s.archived, s.needs_refinement
    )?;
    writeln!(
        w,
        "{} leaves ({} blocked), {} open challenges, {} prover jobs, {} verifier jobs",
        s.leaf_count,
        s.blocked_leaf_count,
        s.open_challenge_count,
        s.prover_job_count,
        s.verifier_job_count
    )
}

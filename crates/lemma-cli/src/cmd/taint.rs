//! `lm taint` — recompute taint labels, optionally without writing.

use crate::cmd::Ctx;
use crate::output::render;
use clap::Args;
use lemma_core::taint::TaintReport;
use std::io::Write;

/// Arguments for `lm taint`.
#[derive(Args, Debug)]
pub struct TaintArgs {
    /// Compute and report diffs without appending events.
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute `lm taint`.
pub fn run(args: &TaintArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let wb = ctx.workbench()?;
    let report = wb.recompute_taint(args.dry_run)?;
    let dry_run = args.dry_run;

    render(ctx.mode, &report, move |report: &TaintReport, w| {
        render_report(report, dry_run, w)
    })
}

fn render_report(report: &TaintReport, dry_run: bool, w: &mut dyn Write) -> std::io::Result<()> {
    let verb = if dry_run { "would change" } else { "changed" };
    writeln!(
        w,
        "{} nodes examined, {} {verb}",
        report.total,
        report.changed()
    )?;
    for diff in &report.diffs {
        writeln!(w, "  {}: {} -> {}", diff.node_id, diff.old, diff.new)?;
    }
    Ok(())
}

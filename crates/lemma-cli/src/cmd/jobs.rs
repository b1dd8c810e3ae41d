//! `lm jobs` — the work board for provers and verifiers.

use crate::cmd::Ctx;
use crate::output::render;
use clap::Args;
use lemma_core::jobs::JobBoard;
use std::io::Write;

/// Arguments for `lm jobs`.
#[derive(Args, Debug)]
pub struct JobsArgs {}

/// Execute `lm jobs`.
pub fn run(_args: &JobsArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let wb = ctx.workbench()?;
    let board = wb.find_jobs()?;
    render(ctx.mode, &board, render_board)
}

fn render_board(board: &JobBoard, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Prover jobs ({})", board.prover_jobs.len())?;
    for job in &board.prover_jobs {
        let challenges = if job.open_challenges > 0 {
            format!(
                "  ({} open, {} blocking)",
                job.open_challenges, job.blocking_challenges
            )
        } else {
            String::new()
        };
        writeln!(w, "  {}  {:?}{challenges}", job.node_id, job.action)?;
    }
    writeln!(w, "Verifier jobs ({})", board.verifier_jobs.len())?;
    for job in &board.verifier_jobs {
        writeln!(w, "  {}  {:?}", job.node_id, job.action)?;
    }
    Ok(())
}

//! `lm assume`, `lm assumptions`, `lm lemma` — the global knowledge base.

use crate::cmd::{Ctx, non_empty, parse_node_id};
use crate::output::{pretty_kv, render};
use clap::Args;
use lemma_core::model::assumption::Assumption;
use serde::Serialize;

/// Arguments for `lm assume`.
#[derive(Args, Debug)]
pub struct AssumeArgs {
    /// The axiom-like statement to record.
    pub statement: String,

    /// Why the assumption is reasonable.
    #[arg(long, short)]
    pub justification: Option<String>,
}

/// Arguments for `lm assumptions`.
#[derive(Args, Debug)]
pub struct AssumptionsArgs {
    /// Show one assumption by id prefix instead of listing all.
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Arguments for `lm lemma`.
#[derive(Args, Debug)]
pub struct LemmaArgs {
    /// Validated, clean node to extract as a reusable lemma.
    pub node: String,
}

#[derive(Debug, Serialize)]
struct LemmaOutput {
    node_id: String,
    statement: String,
}

/// Execute `lm assume`.
pub fn run_assume(args: &AssumeArgs, ctx: &Ctx) -> anyhow::Result<()> {
    non_empty(&args.statement, "statement")?;
    let wb = ctx.workbench()?;
    let assumption = wb.add_assumption(&args.statement, args.justification.clone())?;

    render(ctx.mode, &assumption, |a, w| {
        writeln!(w, "Assumption {}", a.id)?;
        pretty_kv(w, "statement", &a.statement)?;
        if let Some(justification) = &a.justification {
            pretty_kv(w, "justified by", justification)?;
        }
        Ok(())
    })
}

/// Execute `lm assumptions`.
pub fn run_assumptions(args: &AssumptionsArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let wb = ctx.workbench()?;

    if let Some(prefix) = &args.prefix {
        let assumption = wb.assumptions().find_by_prefix(prefix)?;
        return render(ctx.mode, &assumption, render_one);
    }

    let list = wb.assumptions().list()?;
    render(ctx.mode, &list, |assumptions, w| {
        if assumptions.is_empty() {
            return writeln!(w, "No assumptions recorded.");
        }
        for a in assumptions {
            writeln!(w, "{}  {}", a.id, a.statement)?;
        }
        Ok(())
    })
}

fn render_one(a: &Assumption, w: &mut dyn std::io::Write) -> std::io::Result<()> {
    writeln!(w, "Assumption {}", a.id)?;
    pretty_kv(w, "statement", &a.statement)?;
    pretty_kv(w, "hash", &a.content_hash)?;
    pretty_kv(w, "created", a.created_at.to_rfc3339())?;
    if let Some(justification) = &a.justification {
        pretty_kv(w, "justified by", justification)?;
    }
    Ok(())
}

/// Execute `lm lemma`.
pub fn run_lemma(args: &LemmaArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    let wb = ctx.workbench()?;
    let lemma = wb.extract_lemma(&node_id)?;

    let payload = LemmaOutput {
        node_id: lemma.node_id.to_string(),
        statement: lemma.statement,
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(w, "Extracted lemma from {}", out.node_id)?;
        pretty_kv(w, "statement", &out.statement)
    })
}

//! `lm init` — start a proof in a directory.

use crate::cmd::Ctx;
use crate::output::{pretty_kv, render};
use clap::Args;
use lemma_core::Workbench;
use serde::Serialize;

/// Arguments for `lm init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// The conjecture the proof tree aims to establish.
    pub conjecture: String,

    /// Author recorded in the ledger (defaults to the resolved agent).
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Debug, Serialize)]
struct InitOutput {
    root: String,
    conjecture: String,
    author: String,
}

/// Execute `lm init`.
pub fn run(args: &InitArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let author = args.author.clone().unwrap_or_else(|| ctx.agent.clone());
    Workbench::init(&ctx.root, &args.conjecture, &author)?;

    let payload = InitOutput {
        root: ctx.root.display().to_string(),
        conjecture: args.conjecture.clone(),
        author,
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(w, "Initialized proof at {}", out.root)?;
        pretty_kv(w, "conjecture", &out.conjecture)?;
        pretty_kv(w, "author", &out.author)?;
        writeln!(w, "Node 1 is pending. Claim it with `lm claim 1`.")
    })
}

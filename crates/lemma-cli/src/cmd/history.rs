//! `lm history` — the event timeline of one node.

use crate::cmd::{Ctx, parse_node_id};
use crate::output::render;
use clap::Args;
use lemma_core::event::Event;

/// Arguments for `lm history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Node id to show the timeline for.
    pub node: String,

    /// Show at most this many most-recent events.
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

/// Execute `lm history`.
pub fn run(args: &HistoryArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    let wb = ctx.workbench()?;
    let mut events = wb.history(&node_id)?;

    if let Some(limit) = args.limit {
        let skip = events.len().saturating_sub(limit);
        events.drain(..skip);
    }

    render(ctx.mode, &events, |events: &Vec<Event>, w| {
        for event in events {
            writeln!(w, "{event}")?;
        }
        Ok(())
    })
}

//! `lm challenge`, `lm resolve`, `lm withdraw` — the verifier's objection
//! loop.

use crate::cmd::{Ctx, non_empty, parse_node_id};
use crate::output::render;
use clap::Args;
use lemma_core::error::InputError;
use lemma_core::model::challenge::ChallengeTarget;
use serde::Serialize;

/// Arguments for `lm challenge`.
#[derive(Args, Debug)]
pub struct ChallengeArgs {
    /// Node id to challenge.
    pub node: String,

    /// Aspect under objection: statement, inference, context, dependencies,
    /// scope, gap, type_error, or domain.
    #[arg(long, short)]
    pub target: String,

    /// Why the aspect is objectionable.
    #[arg(long, short)]
    pub reason: String,

    /// An older open challenge this one subsumes.
    #[arg(long)]
    pub supersedes: Option<String>,
}

/// Arguments for `lm resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Challenge id to resolve.
    pub challenge: String,

    /// How the objection was addressed.
    #[arg(long)]
    pub response: Option<String>,
}

/// Arguments for `lm withdraw`.
#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Challenge id to withdraw.
    pub challenge: String,
}

#[derive(Debug, Serialize)]
struct ChallengeOutput {
    challenge_id: String,
    node_id: String,
    target: ChallengeTarget,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    challenge_id: String,
    status: &'static str,
}

/// Execute `lm challenge`.
pub fn run_challenge(args: &ChallengeArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let node_id = parse_node_id(&args.node)?;
    non_empty(&args.reason, "reason")?;
    let target: ChallengeTarget =
        args.target
            .parse()
            .map_err(|e: lemma_core::model::challenge::UnknownTarget| {
                lemma_core::LemmaError::from(InputError::InvalidFormat {
                    what: "challenge target",
                    raw: e.raw,
                    reason: "expected one of statement, inference, context, dependencies, \
                             scope, gap, type_error, domain"
                        .to_string(),
                })
            })?;

    let wb = ctx.workbench()?;
    let challenge_id = wb.challenge(
        &node_id,
        target,
        &args.reason,
        Some(ctx.agent.clone()),
        args.supersedes.as_deref(),
    )?;

    let payload = ChallengeOutput {
        challenge_id,
        node_id: args.node.clone(),
        target,
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(
            w,
            "Raised {} on {} ({})",
            out.challenge_id, out.node_id, out.target
        )
    })
}

/// Execute `lm resolve`.
pub fn run_resolve(args: &ResolveArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let wb = ctx.workbench()?;
    wb.resolve_challenge(&args.challenge, args.response.clone())?;

    let payload = StatusOutput {
        challenge_id: args.challenge.clone(),
        status: "resolved",
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(w, "{} {}", out.challenge_id, out.status)
    })
}

/// Execute `lm withdraw`.
pub fn run_withdraw(args: &WithdrawArgs, ctx: &Ctx) -> anyhow::Result<()> {
    let wb = ctx.workbench()?;
    wb.withdraw_challenge(&args.challenge)?;

    let payload = StatusOutput {
        challenge_id: args.challenge.clone(),
        status: "withdrawn",
    };
    render(ctx.mode, &payload, |out, w| {
        writeln!(w, "{} {}", out.challenge_id, out.status)
    })
}

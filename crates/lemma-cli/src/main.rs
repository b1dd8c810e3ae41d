#![forbid(unsafe_code)]

mod agent;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::Ctx;
use lemma_core::LemmaError;
use output::{OutputMode, resolve_output_mode};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lemma: adversarial proof development for agents",
    long_about = None,
    after_help = "QUICK REFERENCE:\n    lm init \"<conjecture>\"   # start a proof (node 1)\n    lm claim 1               # take the node\n    lm refine 1 -s \"...\"     # add a sub-claim\n    lm challenge 1.1 -t gap -r \"...\"\n    lm accept 1.1            # validate once unchallenged\n    lm jobs                  # what should I work on?\n    lm health                # is the proof stuck?"
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text, or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Hidden alias for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Override agent identity (skips env resolution).
    #[arg(long, global = true, overrides_with = "agent")]
    agent: Option<String>,

    /// Proof workspace directory.
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a proof workspace",
        after_help = "EXAMPLES:\n    lm init \"Every even n > 2 is a sum of two primes\"\n    lm init \"...\" --author alice --format json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Prover",
        about = "Claim nodes for exclusive work",
        after_help = "EXAMPLES:\n    lm claim 1\n    lm claim 1.2 1.3 --timeout 7200"
    )]
    Claim(cmd::claim::ClaimArgs),

    #[command(next_help_heading = "Prover", about = "Release claimed nodes")]
    Release(cmd::claim::ReleaseArgs),

    #[command(
        next_help_heading = "Prover",
        about = "Add a sub-claim under a claimed node",
        after_help = "EXAMPLES:\n    lm refine 1 --statement \"Base case: n = 4\" --inference case_split\n    lm refine 1 -s \"...\" -i induction"
    )]
    Refine(cmd::refine::RefineArgs),

    #[command(
        next_help_heading = "Verifier",
        about = "Validate a claim",
        long_about = "Validate a pending (or refined) claim. Refused while open blocking \
                      challenges exist against the node."
    )]
    Accept(cmd::verdict::AcceptArgs),

    #[command(
        next_help_heading = "Verifier",
        about = "Accept a claim without verification (introduces taint)"
    )]
    Admit(cmd::verdict::AdmitArgs),

    #[command(next_help_heading = "Verifier", about = "Refute a claim")]
    Refute(cmd::verdict::RefuteArgs),

    #[command(next_help_heading = "Lifecycle", about = "Archive a settled claim")]
    Archive(cmd::verdict::ArchiveArgs),

    #[command(
        next_help_heading = "Verifier",
        about = "Send a validated claim back for refinement",
        after_help = "EXAMPLES:\n    lm rework 1.2 --reason \"bound is not tight enough\""
    )]
    Rework(cmd::verdict::ReworkArgs),

    #[command(
        next_help_heading = "Verifier",
        about = "Raise a challenge against a node",
        after_help = "EXAMPLES:\n    lm challenge 1.1 --target statement --reason \"ambiguous quantifier\"\n    lm challenge 1.1 -t gap -r \"...\" --supersedes ch-a1b2c3d4e5f6"
    )]
    Challenge(cmd::challenge::ChallengeArgs),

    #[command(next_help_heading = "Prover", about = "Resolve an open challenge")]
    Resolve(cmd::challenge::ResolveArgs),

    #[command(next_help_heading = "Verifier", about = "Withdraw an open challenge")]
    Withdraw(cmd::challenge::WithdrawArgs),

    #[command(
        next_help_heading = "Knowledge",
        about = "Record a globally-scoped assumption",
        after_help = "EXAMPLES:\n    lm assume \"n is a natural number\" --justification \"domain restriction\""
    )]
    Assume(cmd::assume::AssumeArgs),

    #[command(next_help_heading = "Knowledge", about = "List stored assumptions")]
    Assumptions(cmd::assume::AssumptionsArgs),

    #[command(
        next_help_heading = "Knowledge",
        about = "Extract a validated clean claim as a reusable lemma"
    )]
    Lemma(cmd::assume::LemmaArgs),

    #[command(next_help_heading = "Read", about = "Show the whole proof tree")]
    Status(cmd::status::StatusArgs),

    #[command(next_help_heading = "Read", about = "Show one node in detail")]
    Show(cmd::status::ShowArgs),

    #[command(next_help_heading = "Read", about = "Show the event timeline of one node")]
    History(cmd::history::HistoryArgs),

    #[command(next_help_heading = "Read", about = "List actionable prover and verifier jobs")]
    Jobs(cmd::jobs::JobsArgs),

    #[command(next_help_heading = "Read", about = "Diagnose proof health")]
    Health(cmd::health::HealthArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Recompute taint labels",
        after_help = "EXAMPLES:\n    lm taint --dry-run    # report diffs without writing\n    lm taint              # persist taint_recomputed events"
    )]
    Taint(cmd::taint::TaintArgs),

    #[command(next_help_heading = "Maintenance", about = "Release expired claims")]
    Reap(cmd::claim::ReapArgs),
}

fn dispatch(command: &Commands, ctx: &Ctx) -> anyhow::Result<()> {
    match command {
        Commands::Init(args) => cmd::init::run(args, ctx),
        Commands::Claim(args) => cmd::claim::run_claim(args, ctx),
        Commands::Release(args) => cmd::claim::run_release(args, ctx),
        Commands::Refine(args) => cmd::refine::run(args, ctx),
        Commands::Accept(args) => cmd::verdict::run_accept(args, ctx),
        Commands::Admit(args) => cmd::verdict::run_admit(args, ctx),
        Commands::Refute(args) => cmd::verdict::run_refute(args, ctx),
        Commands::Archive(args) => cmd::verdict::run_archive(args, ctx),
        Commands::Rework(args) => cmd::verdict::run_rework(args, ctx),
        Commands::Challenge(args) => cmd::challenge::run_challenge(args, ctx),
        Commands::Resolve(args) => cmd::challenge::run_resolve(args, ctx),
        Commands::Withdraw(args) => cmd::challenge::run_withdraw(args, ctx),
        Commands::Assume(args) => cmd::assume::run_assume(args, ctx),
        Commands::Assumptions(args) => cmd::assume::run_assumptions(args, ctx),
        Commands::Lemma(args) => cmd::assume::run_lemma(args, ctx),
        Commands::Status(args) => cmd::status::run_status(args, ctx),
        Commands::Show(args) => cmd::status::run_show(args, ctx),
        Commands::History(args) => cmd::history::run(args, ctx),
        Commands::Jobs(args) => cmd::jobs::run(args, ctx),
        Commands::Health(args) => cmd::health::run(args, ctx),
        Commands::Taint(args) => cmd::taint::run(args, ctx),
        Commands::Reap(args) => cmd::claim::run_reap(args, ctx),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = Ctx {
        mode: resolve_output_mode(cli.format, cli.json),
        agent: agent::resolve(cli.agent.as_deref()),
        root: cli.dir.clone(),
    };

    if let Err(err) = dispatch(&cli.command, &ctx) {
        match err.downcast_ref::<LemmaError>() {
            Some(lemma_err) => output::render_error(ctx.mode, lemma_err),
            None => eprintln!("Error: {err:#}"),
        }
        std::process::exit(1);
    }
}

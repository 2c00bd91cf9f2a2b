use std::path::Path;

use clap::{Args, Parser, Subcommand};
use demerge::{Direction, Git, Options, Outcome};

#[derive(Parser)]
#[command(name = "demerge")]
#[command(about = "Flatten merge commits into a linear history, and put them back")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite every merge commit after <commit> into a single-parent
    /// commit, recording dropped parents in the message
    #[command(name = "remove-merges")]
    RemoveMerges(RewriteArgs),

    /// Turn recorded merge parents back into real parents
    #[command(name = "unremove-merges")]
    UnremoveMerges(RewriteArgs),
}

#[derive(Args)]
struct RewriteArgs {
    /// Upstream end of the range; commits after it up to the branch tip
    /// are rewritten
    commit: String,

    /// Branch to rewrite instead of the currently checked-out one
    #[arg(long)]
    branch: Option<String>,

    /// Print the would-be new tip without moving any ref
    #[arg(long)]
    dry_run: bool,

    /// Reuse each commit's original committer identity and date
    #[arg(long)]
    keep_committer: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (direction, args) = match cli.command {
        Command::RemoveMerges(args) => (Direction::Remove, args),
        Command::UnremoveMerges(args) => (Direction::Restore, args),
    };

    let level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let git = Git::discover(Path::new("."))?;
    let options = Options {
        branch: args.branch,
        dry_run: args.dry_run,
        keep_committer: args.keep_committer,
    };

    match demerge::run(&git, direction, &args.commit, &options)? {
        Outcome::Updated {
            refname,
            old_tip,
            new_tip,
            commits,
        } => {
            println!(
                "{refname}: {} -> {} ({commits} commits rewritten)",
                short(&old_tip),
                short(&new_tip)
            );
        }
        Outcome::DryRun { new_tip, .. } => {
            println!("{new_tip}");
        }
    }

    Ok(())
}

fn short(hash: &str) -> &str {
    &hash[..8.min(hash.len())]
}

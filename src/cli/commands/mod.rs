//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod explain;
pub mod feedback;
pub mod normalize;
pub mod rank;
pub mod reset;
pub mod stats;
pub mod watch;

use crate::app::AppContext;
use crate::error::Result;

/// Dispatch a command to its handler
pub async fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Rank(args) => rank::run(ctx, args).await,
        Commands::Feedback(args) => feedback::run(ctx, args),
        Commands::Explain(args) => explain::run(ctx, args).await,
        Commands::Stats(args) => stats::run(ctx, args),
        Commands::Reset(args) => reset::run(ctx, args),
        Commands::Watch(args) => watch::run(ctx, args).await,
        Commands::Normalize(args) => normalize::run_without_context(ctx.robot_mode, args),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank the catalog and show one page of recommendations
    Rank(rank::RankArgs),

    /// Record a like or skip for a dish
    Feedback(feedback::FeedbackArgs),

    /// Explain why a dish is recommended
    Explain(explain::ExplainArgs),

    /// Show learned preference weights and tag statistics
    Stats(stats::StatsArgs),

    /// Forget all learned preferences
    Reset(reset::ResetArgs),

    /// Keep recommendations fresh, polling context until interrupted
    Watch(watch::WatchArgs),

    /// Normalize a raw partner menu into catalog items
    Normalize(normalize::NormalizeArgs),
}

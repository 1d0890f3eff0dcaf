use std::time::Duration;

use clap::Args;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::app::AppContext;
use crate::cli::commands::rank::{score_external, show_page};
use crate::error::Result;
use crate::ranking::{Recommender, RefreshReason};

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    /// Context poll period, e.g. "30s" or "15m" (default from config)
    #[arg(long, value_parser = parse_period)]
    pub poll_every: Option<Duration>,

    /// Scheduled re-rank period (default from config)
    #[arg(long, value_parser = parse_period)]
    pub rerank_every: Option<Duration>,

    /// Stop after this many context polls
    #[arg(long)]
    pub polls: Option<u64>,
}

fn parse_period(raw: &str) -> std::result::Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(raw).map_err(|err| err.to_string())
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

/// Show the current page, then keep it fresh: a silent context poll that
/// keeps the page and a scheduled full re-rank, until Ctrl-C.
pub async fn run(ctx: &AppContext, args: &WatchArgs) -> Result<()> {
    let mut session = ctx.recommender()?;
    score_external(ctx, &mut session).await;
    show_page(ctx, &mut session).await?;

    let poll_period = args
        .poll_every
        .unwrap_or_else(|| minutes(ctx.config.ranking.context_poll_minutes))
        .max(MIN_PERIOD);
    let rerank_period = args
        .rerank_every
        .unwrap_or_else(|| minutes(ctx.config.ranking.refresh_interval_minutes))
        .max(MIN_PERIOD);
    let mut poll = interval_at(Instant::now() + poll_period, poll_period);
    let mut rerank = interval_at(Instant::now() + rerank_period, rerank_period);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    rerank.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(?poll_period, ?rerank_period, "watching for changes");

    let mut polls = 0u64;
    loop {
        tokio::select! {
            _ = poll.tick() => {
                polls += 1;
                if !poll_context(ctx, &mut session).await? {
                    debug!(polls, "context unchanged");
                }
                if args.polls.is_some_and(|max| polls >= max) {
                    break;
                }
            }
            _ = rerank.tick() => {
                session.refresh(RefreshReason::Scheduled);
                show_page(ctx, &mut session).await?;
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("interrupted");
                break;
            }
        }
    }
    Ok(())
}

/// One background poll. Re-renders and returns true when the context or
/// profile changed. A read failure keeps the current snapshot.
pub async fn poll_context(ctx: &AppContext, session: &mut Recommender) -> Result<bool> {
    let fresh = ctx
        .load_context()
        .and_then(|context| ctx.load_profile().map(|profile| (context, profile)));
    let (context, profile) = match fresh {
        Ok(fresh) => fresh,
        Err(err) => {
            warn!(error = %err, "context poll failed, keeping current snapshot");
            return Ok(false);
        }
    };
    if context == *session.context() && profile == *session.profile() {
        return Ok(false);
    }
    session.refresh_context(context, profile, true);
    show_page(ctx, session).await?;
    Ok(true)
}

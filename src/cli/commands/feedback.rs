use clap::{ArgGroup, Args};
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::{NpError, Result};
use crate::learning::FeedbackSignal;

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("signal").required(true).args(["like", "skip"])))]
pub struct FeedbackArgs {
    /// Dish id as shown by `rank --robot`
    pub item_id: String,

    /// The dish was a good pick
    #[arg(long)]
    pub like: bool,

    /// The dish was not wanted
    #[arg(long)]
    pub skip: bool,
}

impl FeedbackArgs {
    #[must_use]
    pub const fn signal(&self) -> FeedbackSignal {
        if self.like {
            FeedbackSignal::Like
        } else {
            FeedbackSignal::Skip
        }
    }
}

#[derive(Serialize)]
struct TagUpdate<'a> {
    tag: &'a str,
    weight: f64,
    shown: u64,
    success: u64,
}

#[derive(Serialize)]
struct FeedbackReport<'a> {
    item_id: &'a str,
    signal: FeedbackSignal,
    tags: Vec<TagUpdate<'a>>,
    top: Vec<&'a str>,
}

pub fn run(ctx: &AppContext, args: &FeedbackArgs) -> Result<()> {
    let mut session = ctx.recommender()?;
    let signal = args.signal();
    session.feedback(&args.item_id, signal)?;

    let item = session
        .item(&args.item_id)
        .ok_or_else(|| NpError::ItemNotFound(args.item_id.clone()))?;
    let model = session.preferences().model();
    let bandit = session.preferences().bandit();
    let tags: Vec<TagUpdate<'_>> = item
        .tags
        .iter()
        .map(|tag| {
            let stats = bandit.get(tag);
            TagUpdate {
                tag,
                weight: model.weight(tag),
                shown: stats.shown,
                success: stats.success,
            }
        })
        .collect();
    let ranked = session.ranked();
    let top: Vec<&str> = ranked.iter().take(3).map(|r| r.item.id.as_str()).collect();

    if ctx.robot_mode {
        return emit_robot(&robot_ok(FeedbackReport {
            item_id: &args.item_id,
            signal,
            tags,
            top,
        }));
    }

    let verb = match signal {
        FeedbackSignal::Like => "Liked",
        FeedbackSignal::Skip => "Skipped",
    };
    let mut layout = HumanLayout::new();
    layout.title(&format!("{verb} {}", item.title));
    if tags.is_empty() {
        layout.push_line("This dish has no tags, so nothing was learned.");
    } else {
        layout.section("Tag weights");
        for update in &tags {
            layout.kv(update.tag, &format!("{:+.1}", update.weight));
        }
    }
    layout.blank().section("Now on top");
    for id in &top {
        layout.bullet(id);
    }
    emit_human(layout);
    Ok(())
}

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::learning::{PreferenceStore, TagStats};

#[derive(Args, Debug, Default)]
pub struct StatsArgs {
    /// Only show the N strongest weights
    #[arg(long)]
    pub top: Option<usize>,
}

#[derive(Serialize)]
struct TagRow<'a> {
    tag: &'a str,
    weight: f64,
    shown: u64,
    success: u64,
    rate: f64,
}

pub fn run(ctx: &AppContext, args: &StatsArgs) -> Result<()> {
    let preferences = PreferenceStore::load(ctx.store.clone())?;
    let rows = tag_rows(&preferences, args.top);

    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({
            "tags": rows,
            "learned_weights": preferences.model().len(),
        })));
    }

    let mut layout = HumanLayout::new();
    layout.title("Learned preferences");
    if rows.is_empty() {
        layout.push_line("Nothing learned yet. Like or skip a few dishes first.");
    }
    for row in &rows {
        layout.kv(
            row.tag,
            &format!(
                "{:+5.1}  shown {:>3}  liked {:>3}  rate {:.2}",
                row.weight, row.shown, row.success, row.rate
            ),
        );
    }
    emit_human(layout);
    Ok(())
}

/// Every tag with a weight or counters, strongest absolute weight first.
fn tag_rows(preferences: &PreferenceStore, top: Option<usize>) -> Vec<TagRow<'_>> {
    let model = preferences.model();
    let bandit = preferences.bandit();
    let mut tags: Vec<&str> = model.iter().map(|(tag, _)| tag).collect();
    for (tag, _) in bandit.iter() {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    let mut rows: Vec<TagRow<'_>> = tags
        .into_iter()
        .map(|tag| {
            let stats: TagStats = bandit.get(tag);
            TagRow {
                tag,
                weight: model.weight(tag),
                shown: stats.shown,
                success: stats.success,
                rate: stats.smoothed_rate(),
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.weight
            .abs()
            .total_cmp(&a.weight.abs())
            .then_with(|| a.tag.cmp(b.tag))
    });
    if let Some(limit) = top {
        rows.truncate(limit);
    }
    rows
}

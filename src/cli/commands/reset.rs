use clap::Args;
use tracing::info;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::Result;
use crate::learning::PreferenceStore;

#[derive(Args, Debug, Default)]
pub struct ResetArgs {}

pub fn run(ctx: &AppContext, _args: &ResetArgs) -> Result<()> {
    let mut preferences = PreferenceStore::load(ctx.store.clone())?;
    let forgotten = preferences.model().len();
    preferences.reset()?;
    info!(forgotten, "learning reset");

    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({
            "reset": true,
            "forgotten_weights": forgotten,
        })));
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Preferences reset")
        .kv("Forgotten weights", &forgotten.to_string());
    emit_human(layout);
    Ok(())
}

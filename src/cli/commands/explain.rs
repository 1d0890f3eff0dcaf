use clap::Args;

use crate::app::AppContext;
use crate::cli::commands::rank::HEALTH_ALERT;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::error::{NpError, Result};

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Dish id as shown by `rank --robot`
    pub item_id: String,
}

pub async fn run(ctx: &AppContext, args: &ExplainArgs) -> Result<()> {
    let mut item = ctx
        .load_catalog()?
        .into_iter()
        .find(|item| item.id == args.item_id)
        .ok_or_else(|| NpError::ItemNotFound(args.item_id.clone()))?;
    let context = ctx.load_context()?;
    let profile = ctx.load_profile()?;
    if item.macros.is_none() {
        item.macros = ctx.macro_lookup()?.lookup(&item.title).await?;
    }

    let pipeline = ctx.explanation_pipeline()?;
    let record = pipeline.explain(&item, &context, &profile).await?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(record.as_ref()));
    }

    let mut layout = HumanLayout::new();
    layout.title(&item.title);
    if context.is_high_risk() {
        layout.alert(HEALTH_ALERT).blank();
    }
    layout.paragraph(&record.composed_markup);
    emit_human(layout);
    Ok(())
}

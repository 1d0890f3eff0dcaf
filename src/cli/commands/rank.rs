use clap::Args;
use console::style;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::catalog::CatalogItem;
use crate::cli::output::{HumanLayout, emit_human, emit_robot, robot_ok};
use crate::config::DietSetting;
use crate::error::Result;
use crate::ranking::{FilterPrefs, PageEntry, Recommender};

pub const HEALTH_ALERT: &str =
    "Health alert: your readings are high. Please consult a doctor for personalized guidance.";

#[derive(Args, Debug, Default)]
pub struct RankArgs {
    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Diet filter for this run: none, veg or nonveg
    #[arg(long)]
    pub diet: Option<String>,

    /// Only show satvik dishes
    #[arg(long)]
    pub satvik: bool,

    /// Skip the external suitability scorer
    #[arg(long)]
    pub offline: bool,
}

#[derive(Serialize)]
struct PageReport<'a> {
    page: usize,
    page_count: usize,
    total: usize,
    filter: FilterPrefs,
    health_alert: bool,
    items: Vec<PageEntry<'a>>,
}

pub async fn run(ctx: &AppContext, args: &RankArgs) -> Result<()> {
    let mut session = ctx.recommender()?;
    let filter = filter_for(ctx.config.filter_prefs(), args)?;
    if filter != *session.filter() {
        session.set_filter(filter);
    }

    if !args.offline {
        score_external(ctx, &mut session).await;
    }

    session.set_page(args.page.saturating_sub(1));
    show_page(ctx, &mut session).await
}

/// Run the suitability scorer when enabled and an endpoint is configured.
pub async fn score_external(ctx: &AppContext, session: &mut Recommender) {
    if !ctx.config.scoring.external_scoring || !ctx.collaborators.any_configured() {
        return;
    }
    let scored = session
        .score_external(
            ctx.collaborators.as_ref(),
            ctx.config.scoring.suitability_concurrency,
        )
        .await;
    debug!(scored, "external suitability applied");
}

/// CLI flags layered over the configured filter.
pub fn filter_for(configured: FilterPrefs, args: &RankArgs) -> Result<FilterPrefs> {
    let mut filter = configured;
    if let Some(raw) = args.diet.as_deref() {
        filter.diet = DietSetting::parse(raw)?.preference();
    }
    if args.satvik {
        filter.satvik_only = true;
    }
    Ok(filter)
}

/// Render the session's current page in the active output mode.
pub async fn show_page(ctx: &AppContext, session: &mut Recommender) -> Result<()> {
    let pager = *session.pager();
    let filter = *session.filter();
    let health_alert = session.context().is_high_risk();
    let items = session.render_page().await?;

    if ctx.robot_mode {
        return emit_robot(&robot_ok(PageReport {
            page: pager.page() + 1,
            page_count: pager.page_count(),
            total: pager.total(),
            filter,
            health_alert,
            items,
        }));
    }

    let mut layout = HumanLayout::new();
    layout.title("Recommended for you");
    if health_alert {
        layout.alert(HEALTH_ALERT).blank();
    }
    if items.is_empty() {
        layout.push_line("No dishes match the current filters.");
    }
    for entry in &items {
        layout
            .push_line(format!(
                "{:>3}. {}  {}",
                entry.rank,
                style(&entry.item.title).bold(),
                style(format!("{:.1}", entry.score)).dim()
            ))
            .push_line(format!("     {}", detail_line(entry.item)));
    }
    layout
        .blank()
        .push_line(format!("Page {} of {}", pager.page() + 1, pager.page_count()));
    emit_human(layout);
    Ok(())
}

fn detail_line(item: &CatalogItem) -> String {
    let mut parts = Vec::new();
    if let Some(vendor) = item.vendor_label.as_deref() {
        parts.push(vendor.to_string());
    }
    if let Some(price) = item.price_label() {
        parts.push(format!("₹{price}"));
    }
    if let Some(macros) = item.macros {
        parts.push(format!("{:.0} kcal", macros.kcal));
    }
    if !item.tags.is_empty() {
        parts.push(item.tags.join(", "));
    }
    if parts.is_empty() {
        "(no details)".to_string()
    } else {
        parts.join(" · ")
    }
}

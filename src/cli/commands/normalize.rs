use std::path::PathBuf;

use clap::Args;
use serde::Deserialize;
use tracing::info;

use crate::catalog::{CatalogItem, NormalizedMenu, normalize_menu};
use crate::cli::output::{HumanLayout, emit_human, emit_json, emit_robot, robot_ok};
use crate::error::{NpError, Result};

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Raw partner menu JSON: an array of records or `{ "menus": [...] }`
    pub input: PathBuf,

    /// Write the normalized catalog here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Normalization needs no data root, store or config.
pub fn run_without_context(robot: bool, args: &NormalizeArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.input)?;
    let menus = normalize_document(&raw)?;
    info!(input = %args.input.display(), items = menus.len(), "menu normalized");

    if let Some(path) = &args.output {
        let payload = serde_json::to_string_pretty(&menus)
            .map_err(|err| NpError::Serialization(format!("normalized menu: {err}")))?;
        std::fs::write(path, payload)?;
        if robot {
            return emit_robot(&robot_ok(serde_json::json!({
                "output": path.display().to_string(),
                "items": menus.len(),
            })));
        }
        let mut layout = HumanLayout::new();
        layout
            .title("Menu normalized")
            .kv("Items", &menus.len().to_string())
            .kv("Written to", &path.display().to_string());
        emit_human(layout);
        return Ok(());
    }

    if robot {
        emit_robot(&robot_ok(&menus))
    } else {
        emit_json(&menus)
    }
}

/// Parse and normalize every titled record, in input order.
pub fn normalize_document(raw: &str) -> Result<Vec<NormalizedMenu>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Document {
        Items(Vec<CatalogItem>),
        Envelope { menus: Vec<CatalogItem> },
    }

    let document: Document = serde_json::from_str(raw)
        .map_err(|err| NpError::ValidationFailed(format!("menu document: {err}")))?;
    let items = match document {
        Document::Items(items) | Document::Envelope { menus: items } => items,
    };
    Ok(items
        .into_iter()
        .filter(|item| !item.title.trim().is_empty())
        .map(normalize_menu)
        .collect())
}

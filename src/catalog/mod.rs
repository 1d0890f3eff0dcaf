//! Catalog items (menu dishes) and loading helpers.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{NpError, Result};

pub mod normalize;

pub use normalize::{NormalizedMenu, normalize_menu};

/// Diet classification of an item. `Other` covers labels such as "egg" that
/// are neither; an explicit diet preference excludes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DietType {
    #[serde(alias = "vegetarian")]
    Veg,
    #[serde(alias = "non-veg", alias = "non_veg")]
    NonVeg,
    Other,
}

impl DietType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Veg => "veg",
            Self::NonVeg => "nonveg",
            Self::Other => "other",
        }
    }

    /// Classify a free-form `type` label. Blank means unclassified.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" => None,
            "veg" | "vegetarian" => Some(Self::Veg),
            "nonveg" | "non-veg" | "non_veg" | "non veg" => Some(Self::NonVeg),
            _ => Some(Self::Other),
        }
    }
}

/// Unknown labels read as [`DietType::Other`]; blank or non-string labels
/// leave the item unclassified.
fn lenient_diet<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DietType>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(serde_json::Value::as_str).and_then(DietType::parse))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    #[serde(default)]
    pub kcal: f64,
    #[serde(default)]
    pub protein_g: f64,
    #[serde(default)]
    pub carbs_g: f64,
    #[serde(default)]
    pub fat_g: f64,
    #[serde(default)]
    pub sodium_mg: Option<f64>,
}

impl Macros {
    #[must_use]
    pub const fn new(kcal: f64, protein_g: f64, carbs_g: f64, fat_g: f64) -> Self {
        Self {
            kcal,
            protein_g,
            carbs_g,
            fat_g,
            sodium_mg: None,
        }
    }
}

/// A recommendable dish.
///
/// `macros` and `suitability` start out empty for most partner menus and are
/// filled in lazily during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default)]
    pub id: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient_diet")]
    pub diet: Option<DietType>,
    #[serde(default)]
    pub macros: Option<Macros>,
    #[serde(default, alias = "llmScore", alias = "external_suitability_score")]
    pub suitability: Option<f64>,
    #[serde(default, alias = "hotel", alias = "vendor")]
    pub vendor_label: Option<String>,
    #[serde(default)]
    pub price: Option<serde_json::Value>,
    #[serde(default)]
    pub link: Option<String>,
}

impl CatalogItem {
    pub fn new(title: impl Into<String>, tags: &[&str]) -> Self {
        let title = title.into();
        let mut item = Self {
            id: slug(&title),
            title,
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
            diet: None,
            macros: None,
            suitability: None,
            vendor_label: None,
            price: None,
            link: None,
        };
        item.tidy();
        item
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub const fn with_diet(mut self, diet: DietType) -> Self {
        self.diet = Some(diet);
        self
    }

    #[must_use]
    pub const fn with_macros(mut self, macros: Macros) -> Self {
        self.macros = Some(macros);
        self
    }

    #[must_use]
    pub const fn with_suitability(mut self, score: f64) -> Self {
        self.suitability = Some(score);
        self
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    #[must_use]
    pub fn first_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    /// Trim the title, derive a missing id and drop repeated or blank tags
    /// while keeping first-seen order.
    pub fn tidy(&mut self) {
        self.title = self.title.trim().to_string();
        if self.id.trim().is_empty() {
            self.id = slug(&self.title);
        }
        let mut seen = HashSet::new();
        self.tags.retain(|tag| !tag.trim().is_empty() && seen.insert(tag.clone()));
    }

    /// Human-facing price text, whatever shape the source used.
    #[must_use]
    pub fn price_label(&self) -> Option<String> {
        match self.price.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Lowercase ASCII slug, runs of anything else collapsed to a single dash.
#[must_use]
pub fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.nfkd().filter(char::is_ascii) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Load a catalog JSON file. Accepts either a bare array of items or a
/// `{ "menus": [...] }` envelope; untitled entries are skipped.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogItem>> {
    let raw = std::fs::read_to_string(path)?;
    parse_catalog(&raw)
        .map_err(|err| NpError::ValidationFailed(format!("catalog {}: {err}", path.display())))
}

pub fn parse_catalog(raw: &str) -> Result<Vec<CatalogItem>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Document {
        Items(Vec<CatalogItem>),
        Envelope { menus: Vec<CatalogItem> },
    }

    let document: Document = serde_json::from_str(raw)?;
    let items = match document {
        Document::Items(items) | Document::Envelope { menus: items } => items,
    };
    let mut items: Vec<CatalogItem> = items
        .into_iter()
        .map(|mut item| {
            item.tidy();
            item
        })
        .filter(|item| !item.title.is_empty())
        .collect();
    disambiguate_ids(&mut items);
    Ok(items)
}

/// Ids must be unique: explanation records and feedback are keyed by id.
fn disambiguate_ids(items: &mut [CatalogItem]) {
    let mut seen = HashSet::new();
    for (idx, item) in items.iter_mut().enumerate() {
        if !seen.insert(item.id.clone()) {
            item.id = format!("{}-{idx}", item.id);
            seen.insert(item.id.clone());
        }
    }
}

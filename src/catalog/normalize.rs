//! Partner menu normalization.
//!
//! Raw partner menus usually carry just a dish name, a hotel and a price.
//! Normalization infers the semantic tags, diet type and an estimated macro
//! profile from keywords in the dish name so the scorer has something to
//! work with before any nutrition lookup has happened.

use serde::{Deserialize, Serialize};

use super::{CatalogItem, DietType, Macros};

const NONVEG_KEYWORDS: &[&str] = &[
    "chicken", "fish", "egg", "mutton", "prawns", "crab", "surmai", "pomfret", "bangda", "bombil",
    "mandeli", "tisrya",
];

const TAG_RULES: &[(&str, &[&str])] = &[
    (
        "high-protein-snack",
        &[
            "protein", "chicken", "paneer", "egg", "fish", "prawns", "tikka", "grilled", "tandoor",
            "mutton", "omelette",
        ],
    ),
    ("low-carb", &["salad", "grilled", "tikka", "tandoor", "steamed", "soup", "egg white"]),
    ("low-sodium", &["steamed", "boiled", "soup", "clear soup", "salad"]),
    (
        "light-clean",
        &["salad", "soup", "steamed", "boiled", "light", "clear", "juice", "smoothie", "oats"],
    ),
    ("satvik", &["khichdi", "dal", "rice", "fruit", "curd", "yogurt", "milk"]),
];

/// Estimated per-serving macros by dish kind, first match wins.
const MACRO_TEMPLATES: &[(&[&str], Macros)] = &[
    (&["salad"], Macros::new(100.0, 8.0, 10.0, 3.0)),
    (&["protein", "tikka", "grilled"], Macros::new(250.0, 20.0, 15.0, 10.0)),
    (&["soup"], Macros::new(80.0, 5.0, 8.0, 2.0)),
    (&["biryani", "pulao"], Macros::new(320.0, 15.0, 45.0, 12.0)),
    (&["rice", "khichdi"], Macros::new(300.0, 12.0, 50.0, 8.0)),
    (&["curry", "masala"], Macros::new(220.0, 12.0, 18.0, 12.0)),
    (&["sandwich", "toast"], Macros::new(200.0, 10.0, 25.0, 6.0)),
    (&["wrap"], Macros::new(220.0, 12.0, 28.0, 7.0)),
    (&["juice", "smoothie", "milkshake"], Macros::new(60.0, 1.0, 14.0, 0.0)),
    (&["dessert", "sweet", "kulfi", "ice cream"], Macros::new(180.0, 3.0, 30.0, 6.0)),
    (&["oats", "light"], Macros::new(180.0, 10.0, 20.0, 5.0)),
];

const DEFAULT_MACROS: Macros = Macros::new(200.0, 10.0, 25.0, 8.0);

const ORDER_SEARCH_URL: &str = "https://www.swiggy.com/search?q=";

/// A catalog item plus the generated description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMenu {
    #[serde(flatten)]
    pub item: CatalogItem,
    pub description: String,
}

#[must_use]
pub fn infer_diet(name: &str) -> DietType {
    let lower = name.to_lowercase();
    if NONVEG_KEYWORDS.iter().any(|k| lower.contains(k)) {
        DietType::NonVeg
    } else {
        DietType::Veg
    }
}

#[must_use]
pub fn infer_tags(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    TAG_RULES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(tag, _)| (*tag).to_string())
        .collect()
}

/// Template macros for a known dish kind, if the name matches one.
#[must_use]
pub fn template_macros(name: &str) -> Option<Macros> {
    let lower = name.to_lowercase();
    MACRO_TEMPLATES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, macros)| *macros)
}

#[must_use]
pub fn estimate_macros(name: &str) -> Macros {
    template_macros(name).unwrap_or(DEFAULT_MACROS)
}

#[must_use]
pub fn describe(name: &str, vendor: &str) -> String {
    let lower = name.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["salad"]) {
        format!("Fresh {lower} from {vendor}")
    } else if has(&["meal box", "thali"]) {
        format!("Complete {lower} served at {vendor}")
    } else if has(&["biryani", "pulao"]) {
        format!("Aromatic {lower} prepared by {vendor}")
    } else if has(&["tikka", "tandoor", "grilled"]) {
        format!("Grilled {lower} from {vendor}")
    } else if has(&["soup"]) {
        format!("Warm {lower} served at {vendor}")
    } else if has(&["juice", "smoothie"]) {
        format!("Fresh {lower} from {vendor}")
    } else {
        format!("Delicious {lower} from {vendor}")
    }
}

/// Fill in everything a raw partner record is missing. Explicit tags, type
/// and macros from the source are kept; inferred tags are appended.
#[must_use]
pub fn normalize_menu(mut item: CatalogItem) -> NormalizedMenu {
    item.tidy();
    let vendor = item
        .vendor_label
        .clone()
        .unwrap_or_else(|| "Unknown Vendor".to_string());

    item.tags.extend(infer_tags(&item.title));
    item.tidy();
    if item.diet.is_none() {
        item.diet = Some(infer_diet(&item.title));
    }
    if item.macros.is_none() {
        item.macros = Some(estimate_macros(&item.title));
    }
    if item.link.is_none() {
        let query = format!("{} {}", item.title, item.vendor_label.as_deref().unwrap_or(""));
        item.link = Some(format!(
            "{ORDER_SEARCH_URL}{}",
            urlencoding::encode(query.trim())
        ));
    }
    item.vendor_label = Some(vendor.clone());

    let description = describe(&item.title, &vendor);
    NormalizedMenu { item, description }
}

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::catalog::{CatalogItem, DietType, Macros};
use crate::collaborators::{
    Evidence, EvidenceSource, NarrativeGenerator, NutritionSource, SuitabilityScorer,
};
use crate::context::ContextSnapshot;
use crate::error::{NpError, Result};
use crate::explain::NarrativePrompt;

/// Test fixture providing an isolated data root.
pub struct UnitTestFixture {
    pub temp_dir: TempDir,
    pub data_path: PathBuf,
}

impl Default for UnitTestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitTestFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().to_path_buf();

        println!("[FIXTURE] Created temp directory: {data_path:?}");

        Self {
            temp_dir,
            data_path,
        }
    }

    /// Create a test file with content.
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.data_path.join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        println!(
            "[FIXTURE] Created file: {:?} ({} bytes)",
            full_path,
            content.len()
        );
        full_path
    }

    /// Write `catalog.json` at the data root.
    #[must_use]
    pub fn write_catalog(&self, items: &[CatalogItem]) -> PathBuf {
        let raw = serde_json::to_string_pretty(items).expect("catalog serializes");
        self.create_file("catalog.json", &raw)
    }

    #[must_use]
    pub fn write_context(&self, context: &Value) -> PathBuf {
        self.create_file("context.json", &context.to_string())
    }

    #[must_use]
    pub fn write_profile(&self, profile: &Value) -> PathBuf {
        self.create_file("profile.json", &profile.to_string())
    }
}

impl Drop for UnitTestFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.data_path);
    }
}

/// Small mixed menu covering every filter and scoring branch.
#[must_use]
pub fn sample_catalog() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("Clear Vegetable Soup", &["low-sodium", "light-clean"])
            .with_diet(DietType::Veg),
        CatalogItem::new("Grilled Chicken Tikka", &["high-protein-snack", "low-carb"])
            .with_diet(DietType::NonVeg)
            .with_macros(Macros::new(250.0, 20.0, 15.0, 10.0)),
        CatalogItem::new("Moong Dal Khichdi", &["satvik"]).with_diet(DietType::Veg),
        CatalogItem::new("Masala Fries", &["high-sodium"]).with_diet(DietType::Veg),
        CatalogItem::new("Plain Curd", &[]),
    ]
}

/// Wearable snapshot with elevated pressure and a post-workout burn.
#[must_use]
pub fn elevated_context() -> Value {
    json!({
        "heartRate": 88,
        "steps": 9000,
        "caloriesBurned": 520,
        "bpSystolic": 142,
        "bpDiastolic": 91,
        "activityLevel": "high"
    })
}

#[must_use]
pub fn high_bp_profile() -> Value {
    json!({
        "tags": ["low-sodium"],
        "medicalFlags": ["high-bp"],
        "reasoning": "Elevated readings this week"
    })
}

/// Collaborator set answering from fixed data and counting every call.
#[derive(Debug, Default)]
pub struct CountingCollaborators {
    pub suitability: Option<f64>,
    pub evidence: Option<Evidence>,
    pub macros: Option<Macros>,
    pub narrative: Option<String>,
    pub failing: bool,
    suitability_calls: AtomicUsize,
    evidence_calls: AtomicUsize,
    nutrition_calls: AtomicUsize,
    narrative_calls: AtomicUsize,
}

/// Call counts per collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub suitability: usize,
    pub evidence: usize,
    pub nutrition: usize,
    pub narrative: usize,
}

impl CountingCollaborators {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `NpError::Collaborator`.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_suitability(mut self, score: f64) -> Self {
        self.suitability = Some(score);
        self
    }

    #[must_use]
    pub fn with_evidence(mut self, title: &str, url: &str, summary: &str) -> Self {
        self.evidence = Some(Evidence {
            title: title.to_string(),
            url: url.to_string(),
            summary: summary.to_string(),
        });
        self
    }

    #[must_use]
    pub const fn with_macros(mut self, macros: Macros) -> Self {
        self.macros = Some(macros);
        self
    }

    #[must_use]
    pub fn with_narrative(mut self, text: &str) -> Self {
        self.narrative = Some(text.to_string());
        self
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            suitability: self.suitability_calls.load(Ordering::SeqCst),
            evidence: self.evidence_calls.load(Ordering::SeqCst),
            nutrition: self.nutrition_calls.load(Ordering::SeqCst),
            narrative: self.narrative_calls.load(Ordering::SeqCst),
        }
    }

    fn answer<T: Clone>(&self, counter: &AtomicUsize, value: &Option<T>) -> Result<Option<T>> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(NpError::Collaborator("scripted failure".to_string()));
        }
        Ok(value.clone())
    }
}

#[async_trait]
impl SuitabilityScorer for CountingCollaborators {
    async fn suitability_score(
        &self,
        _context: &ContextSnapshot,
        _item: &CatalogItem,
    ) -> Result<Option<f64>> {
        self.answer(&self.suitability_calls, &self.suitability)
    }
}

#[async_trait]
impl EvidenceSource for CountingCollaborators {
    async fn evidence(&self, _query: &str) -> Result<Option<Evidence>> {
        self.answer(&self.evidence_calls, &self.evidence)
    }
}

#[async_trait]
impl NutritionSource for CountingCollaborators {
    async fn macros(&self, _title: &str) -> Result<Option<Macros>> {
        self.answer(&self.nutrition_calls, &self.macros)
    }
}

#[async_trait]
impl NarrativeGenerator for CountingCollaborators {
    async fn generate(&self, _prompt: &NarrativePrompt) -> Result<Option<String>> {
        self.answer(&self.narrative_calls, &self.narrative)
    }
}

//! Network collaborators consumed by the core.
//!
//! Every method answers `Ok(None)` when the collaborator has nothing to say
//! and `Err(NpError::Collaborator)` when it could not be reached or answered
//! garbage. Callers own the fallback for both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogItem, Macros};
use crate::context::ContextSnapshot;
use crate::error::Result;
use crate::explain::NarrativePrompt;

pub mod http;

pub use http::HttpCollaborators;

/// A research reference backing a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub title: String,
    pub url: String,
    #[serde(default, rename = "abstract")]
    pub summary: String,
}

#[async_trait]
pub trait SuitabilityScorer: Send + Sync {
    /// Suitability of an item for the current context, nominally 0–10.
    async fn suitability_score(
        &self,
        context: &ContextSnapshot,
        item: &CatalogItem,
    ) -> Result<Option<f64>>;
}

#[async_trait]
pub trait EvidenceSource: Send + Sync {
    async fn evidence(&self, query: &str) -> Result<Option<Evidence>>;
}

#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn macros(&self, title: &str) -> Result<Option<Macros>>;
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &NarrativePrompt) -> Result<Option<String>>;
}

/// Collaborator set that never answers; every lookup takes its fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl SuitabilityScorer for Offline {
    async fn suitability_score(&self, _: &ContextSnapshot, _: &CatalogItem) -> Result<Option<f64>> {
        Ok(None)
    }
}

#[async_trait]
impl EvidenceSource for Offline {
    async fn evidence(&self, _: &str) -> Result<Option<Evidence>> {
        Ok(None)
    }
}

#[async_trait]
impl NutritionSource for Offline {
    async fn macros(&self, _: &str) -> Result<Option<Macros>> {
        Ok(None)
    }
}

#[async_trait]
impl NarrativeGenerator for Offline {
    async fn generate(&self, _: &NarrativePrompt) -> Result<Option<String>> {
        Ok(None)
    }
}

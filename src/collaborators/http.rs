//! HTTP implementations of the collaborator traits.
//!
//! Request and response bodies are plain JSON. Transport failures and non-2xx
//! statuses become [`NpError::Collaborator`]; odd-but-parseable bodies are
//! coerced to the safe default instead.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::catalog::{CatalogItem, Macros};
use crate::config::CollaboratorsConfig;
use crate::context::ContextSnapshot;
use crate::error::{NpError, Result};
use crate::explain::NarrativePrompt;

use super::{Evidence, EvidenceSource, NarrativeGenerator, NutritionSource, SuitabilityScorer};

const USER_AGENT: &str = concat!("nutripick/", env!("CARGO_PKG_VERSION"));
const NARRATIVE_FIELDS: [&str; 3] = ["text", "answer", "narrative"];

pub struct HttpCollaborators {
    client: Client,
    endpoints: CollaboratorsConfig,
}

impl HttpCollaborators {
    pub fn new(endpoints: CollaboratorsConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| NpError::Config(format!("http client: {err}")))?;
        Ok(Self { client, endpoints })
    }

    /// True when at least one endpoint is configured.
    #[must_use]
    pub const fn any_configured(&self) -> bool {
        self.endpoints.suitability_url.is_some()
            || self.endpoints.evidence_url.is_some()
            || self.endpoints.nutrition_url.is_some()
            || self.endpoints.narrative_url.is_some()
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<String> {
        let response = request
            .send()
            .await
            .map_err(|err| NpError::Collaborator(format!("{what}: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(NpError::Collaborator(format!("{what}: HTTP {status}")));
        }
        response
            .text()
            .await
            .map_err(|err| NpError::Collaborator(format!("{what}: {err}")))
    }

    async fn send_json(&self, request: RequestBuilder, what: &str) -> Result<Value> {
        let body = self.send(request, what).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|err| NpError::Collaborator(format!("{what}: invalid json: {err}")))
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is 0.
#[must_use]
pub fn coerce_score(raw: &Value) -> f64 {
    let score = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    score.filter(|s| s.is_finite()).unwrap_or(0.0)
}

/// Narrative text from a JSON object field, a bare JSON string or a plain
/// text body.
#[must_use]
pub fn extract_narrative(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => NARRATIVE_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_str))
            .map(str::to_string),
        Ok(Value::String(text)) => Some(text),
        Ok(_) => None,
        Err(_) => Some(body.to_string()),
    }
}

fn with_query(base: &str, query: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}q={}", urlencoding::encode(query))
}

#[async_trait]
impl SuitabilityScorer for HttpCollaborators {
    async fn suitability_score(
        &self,
        context: &ContextSnapshot,
        item: &CatalogItem,
    ) -> Result<Option<f64>> {
        let Some(url) = self.endpoints.suitability_url.as_deref() else {
            return Ok(None);
        };
        let body = json!({
            "vitals": context,
            "macros": item.macros.map_or_else(|| json!({}), |m| json!(m)),
            "tags": item.tags,
            "title": item.title,
        });
        let reply = self
            .send_json(self.client.post(url).json(&body), "suitability")
            .await?;
        let score = coerce_score(reply.get("score").unwrap_or(&Value::Null));
        debug!(item = %item.id, score, "suitability scored");
        Ok(Some(score))
    }
}

#[async_trait]
impl EvidenceSource for HttpCollaborators {
    async fn evidence(&self, query: &str) -> Result<Option<Evidence>> {
        let Some(url) = self.endpoints.evidence_url.as_deref() else {
            return Ok(None);
        };
        let reply = self
            .send_json(self.client.get(with_query(url, query)), "evidence")
            .await?;
        if reply.is_null() {
            return Ok(None);
        }
        match serde_json::from_value::<Evidence>(reply) {
            Ok(evidence) => Ok(Some(evidence)),
            Err(err) => {
                warn!(query, error = %err, "unexpected evidence shape, ignoring");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl NutritionSource for HttpCollaborators {
    async fn macros(&self, title: &str) -> Result<Option<Macros>> {
        let Some(url) = self.endpoints.nutrition_url.as_deref() else {
            return Ok(None);
        };
        let reply = self
            .send_json(self.client.get(with_query(url, title)), "nutrition")
            .await?;
        if reply.is_null() {
            return Ok(None);
        }
        match serde_json::from_value::<Macros>(reply) {
            Ok(macros) => Ok(Some(macros)),
            Err(err) => {
                warn!(title, error = %err, "unexpected nutrition shape, ignoring");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl NarrativeGenerator for HttpCollaborators {
    async fn generate(&self, prompt: &NarrativePrompt) -> Result<Option<String>> {
        let Some(url) = self.endpoints.narrative_url.as_deref() else {
            return Ok(None);
        };
        let body = self
            .send(self.client.post(url).json(prompt), "narrative")
            .await?;
        Ok(extract_narrative(&body))
    }
}

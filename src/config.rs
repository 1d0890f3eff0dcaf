use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_MACRO_TTL;
use crate::error::{NpError, Result};
use crate::explain::DEFAULT_ABSTRACT_MAX_CHARS;
use crate::ranking::pager::DEFAULT_PAGE_SIZE;
use crate::ranking::{DietPreference, FilterPrefs};
use crate::scoring::DEFAULT_NOVELTY_MAX;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub explain: ExplainConfig,
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Defaults, then either an explicit file or the global and project
    /// files, then `NP_*` environment overrides.
    pub fn load(explicit_path: Option<&Path>, root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("NP_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                NpError::MissingConfig(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a single TOML document on top of the defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let patch: ConfigPatch =
            toml::from_str(raw).map_err(|err| NpError::Config(format!("parse config: {err}")))?;
        let mut config = Self::default();
        config.merge_patch(patch);
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn filter_prefs(&self) -> FilterPrefs {
        FilterPrefs {
            diet: self.filters.diet.preference(),
            satvik_only: self.filters.satvik_only,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.ranking.page_size == 0 {
            return Err(NpError::Config("ranking.page_size must be at least 1".into()));
        }
        if !self.scoring.novelty_max.is_finite() || self.scoring.novelty_max < 0.0 {
            return Err(NpError::Config(format!(
                "scoring.novelty_max must be a non-negative number, got {}",
                self.scoring.novelty_max
            )));
        }
        if self.scoring.suitability_concurrency == 0 {
            return Err(NpError::Config(
                "scoring.suitability_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("nutripick/config.toml"))
    }

    fn load_project(root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&root.join("config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| NpError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| NpError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.ranking {
            self.ranking.merge(patch);
        }
        if let Some(patch) = patch.filters {
            self.filters.merge(patch);
        }
        if let Some(patch) = patch.scoring {
            self.scoring.merge(patch);
        }
        if let Some(patch) = patch.cache {
            self.cache.merge(patch);
        }
        if let Some(patch) = patch.explain {
            self.explain.merge(patch);
        }
        if let Some(patch) = patch.collaborators {
            self.collaborators.merge(patch);
        }
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
        if let Some(patch) = patch.data {
            self.data.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_usize("NP_PAGE_SIZE")? {
            self.ranking.page_size = value;
        }
        if let Some(value) = env_u64("NP_REFRESH_INTERVAL_MINUTES")? {
            self.ranking.refresh_interval_minutes = value;
        }
        if let Some(value) = env_u64("NP_CONTEXT_POLL_MINUTES")? {
            self.ranking.context_poll_minutes = value;
        }

        if let Some(value) = env_string("NP_DIET") {
            self.filters.diet = DietSetting::parse(&value)?;
        }
        if let Some(value) = env_bool("NP_SATVIK_ONLY") {
            self.filters.satvik_only = value;
        }

        if let Some(value) = env_f64("NP_NOVELTY_MAX")? {
            self.scoring.novelty_max = value;
        }
        if let Some(value) = env_u64("NP_NOVELTY_SEED")? {
            self.scoring.novelty_seed = Some(value);
        }
        if let Some(value) = env_usize("NP_SUITABILITY_CONCURRENCY")? {
            self.scoring.suitability_concurrency = value;
        }
        if let Some(value) = env_bool("NP_EXTERNAL_SCORING") {
            self.scoring.external_scoring = value;
        }

        if let Some(value) = env_duration("NP_MACRO_TTL")? {
            self.cache.macro_ttl = value;
        }
        if let Some(value) = env_usize("NP_ABSTRACT_MAX_CHARS")? {
            self.explain.abstract_max_chars = value;
        }

        if let Some(value) = env_string("NP_SUITABILITY_URL") {
            self.collaborators.suitability_url = Some(value);
        }
        if let Some(value) = env_string("NP_EVIDENCE_URL") {
            self.collaborators.evidence_url = Some(value);
        }
        if let Some(value) = env_string("NP_NUTRITION_URL") {
            self.collaborators.nutrition_url = Some(value);
        }
        if let Some(value) = env_string("NP_NARRATIVE_URL") {
            self.collaborators.narrative_url = Some(value);
        }

        if let Some(value) = env_string("NP_STORAGE_BACKEND") {
            self.storage.backend = StorageBackend::parse(&value)?;
        }

        if let Some(value) = env_string("NP_CATALOG") {
            self.data.catalog = Some(PathBuf::from(value));
        }
        if let Some(value) = env_string("NP_CONTEXT") {
            self.data.context = Some(PathBuf::from(value));
        }
        if let Some(value) = env_string("NP_PROFILE") {
            self.data.profile = Some(PathBuf::from(value));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Scheduled full re-rank while watching.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u64,
    /// Silent context poll while watching.
    #[serde(default = "default_context_poll")]
    pub context_poll_minutes: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            refresh_interval_minutes: default_refresh_interval(),
            context_poll_minutes: default_context_poll(),
        }
    }
}

impl RankingConfig {
    fn merge(&mut self, patch: RankingPatch) {
        if let Some(value) = patch.page_size {
            self.page_size = value;
        }
        if let Some(value) = patch.refresh_interval_minutes {
            self.refresh_interval_minutes = value;
        }
        if let Some(value) = patch.context_poll_minutes {
            self.context_poll_minutes = value;
        }
    }
}

/// Diet filter as written in config: `none`, `veg` or `nonveg`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DietSetting {
    #[default]
    #[serde(rename = "none", alias = "any")]
    Any,
    Veg,
    #[serde(alias = "non-veg")]
    NonVeg,
}

impl DietSetting {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "none" | "any" => Ok(Self::Any),
            other => match DietPreference::parse(other) {
                Some(DietPreference::Veg) => Ok(Self::Veg),
                Some(DietPreference::NonVeg) => Ok(Self::NonVeg),
                None => Err(NpError::Config(format!(
                    "invalid diet {raw} (expected none|veg|nonveg)"
                ))),
            },
        }
    }

    #[must_use]
    pub const fn preference(self) -> Option<DietPreference> {
        match self {
            Self::Any => None,
            Self::Veg => Some(DietPreference::Veg),
            Self::NonVeg => Some(DietPreference::NonVeg),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub diet: DietSetting,
    #[serde(default)]
    pub satvik_only: bool,
}

impl FiltersConfig {
    fn merge(&mut self, patch: FiltersPatch) {
        if let Some(value) = patch.diet {
            self.diet = value;
        }
        if let Some(value) = patch.satvik_only {
            self.satvik_only = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_novelty_max")]
    pub novelty_max: f64,
    /// Fixed seed for the novelty term; unset draws from OS entropy.
    #[serde(default)]
    pub novelty_seed: Option<u64>,
    #[serde(default = "default_concurrency")]
    pub suitability_concurrency: usize,
    #[serde(default = "default_true")]
    pub external_scoring: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            novelty_max: DEFAULT_NOVELTY_MAX,
            novelty_seed: None,
            suitability_concurrency: default_concurrency(),
            external_scoring: true,
        }
    }
}

impl ScoringConfig {
    fn merge(&mut self, patch: ScoringPatch) {
        if let Some(value) = patch.novelty_max {
            self.novelty_max = value;
        }
        if let Some(value) = patch.novelty_seed {
            self.novelty_seed = Some(value);
        }
        if let Some(value) = patch.suitability_concurrency {
            self.suitability_concurrency = value;
        }
        if let Some(value) = patch.external_scoring {
            self.external_scoring = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_macro_ttl", with = "humantime_serde")]
    pub macro_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            macro_ttl: DEFAULT_MACRO_TTL,
        }
    }
}

impl CacheConfig {
    fn merge(&mut self, patch: CachePatch) {
        if let Some(value) = patch.macro_ttl {
            self.macro_ttl = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainConfig {
    #[serde(default = "default_abstract_max_chars")]
    pub abstract_max_chars: usize,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            abstract_max_chars: DEFAULT_ABSTRACT_MAX_CHARS,
        }
    }
}

impl ExplainConfig {
    fn merge(&mut self, patch: ExplainPatch) {
        if let Some(value) = patch.abstract_max_chars {
            self.abstract_max_chars = value;
        }
    }
}

/// Collaborator endpoints. An unset endpoint is treated as offline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorsConfig {
    #[serde(default)]
    pub suitability_url: Option<String>,
    #[serde(default)]
    pub evidence_url: Option<String>,
    #[serde(default)]
    pub nutrition_url: Option<String>,
    #[serde(default)]
    pub narrative_url: Option<String>,
}

impl CollaboratorsConfig {
    fn merge(&mut self, patch: CollaboratorsPatch) {
        if let Some(value) = patch.suitability_url {
            self.suitability_url = Some(value);
        }
        if let Some(value) = patch.evidence_url {
            self.evidence_url = Some(value);
        }
        if let Some(value) = patch.nutrition_url {
            self.nutrition_url = Some(value);
        }
        if let Some(value) = patch.narrative_url {
            self.narrative_url = Some(value);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
}

impl StorageBackend {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json" => Ok(Self::Json),
            _ => Err(NpError::Config(format!(
                "invalid storage backend {raw} (expected sqlite|json)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(value) = patch.backend {
            self.backend = value;
        }
    }
}

/// Input files. Relative paths resolve against the data root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub context: Option<PathBuf>,
    #[serde(default)]
    pub profile: Option<PathBuf>,
}

impl DataConfig {
    fn merge(&mut self, patch: DataPatch) {
        if let Some(value) = patch.catalog {
            self.catalog = Some(value);
        }
        if let Some(value) = patch.context {
            self.context = Some(value);
        }
        if let Some(value) = patch.profile {
            self.profile = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub ranking: Option<RankingPatch>,
    pub filters: Option<FiltersPatch>,
    pub scoring: Option<ScoringPatch>,
    pub cache: Option<CachePatch>,
    pub explain: Option<ExplainPatch>,
    pub collaborators: Option<CollaboratorsPatch>,
    pub storage: Option<StoragePatch>,
    pub data: Option<DataPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RankingPatch {
    pub page_size: Option<usize>,
    pub refresh_interval_minutes: Option<u64>,
    pub context_poll_minutes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FiltersPatch {
    pub diet: Option<DietSetting>,
    pub satvik_only: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ScoringPatch {
    pub novelty_max: Option<f64>,
    pub novelty_seed: Option<u64>,
    pub suitability_concurrency: Option<usize>,
    pub external_scoring: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CachePatch {
    #[serde(default, with = "humantime_serde")]
    pub macro_ttl: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExplainPatch {
    pub abstract_max_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CollaboratorsPatch {
    pub suitability_url: Option<String>,
    pub evidence_url: Option<String>,
    pub nutrition_url: Option<String>,
    pub narrative_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoragePatch {
    pub backend: Option<StorageBackend>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DataPatch {
    pub catalog: Option<PathBuf>,
    pub context: Option<PathBuf>,
    pub profile: Option<PathBuf>,
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

const fn default_refresh_interval() -> u64 {
    60
}

const fn default_context_poll() -> u64 {
    15
}

const fn default_novelty_max() -> f64 {
    DEFAULT_NOVELTY_MAX
}

const fn default_concurrency() -> usize {
    1
}

const fn default_true() -> bool {
    true
}

const fn default_macro_ttl() -> Duration {
    DEFAULT_MACRO_TTL
}

const fn default_abstract_max_chars() -> usize {
    DEFAULT_ABSTRACT_MAX_CHARS
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<usize>().map(Some).map_err(|err| {
            NpError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<u64>().map(Some).map_err(|err| {
            NpError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(value) => value.parse::<f64>().map(Some).map_err(|err| {
            NpError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        Err(_) => Ok(None),
    }
}

fn env_duration(key: &str) -> Result<Option<Duration>> {
    match std::env::var(key) {
        Ok(value) => humantime_serde::re::humantime::parse_duration(&value)
            .map(Some)
            .map_err(|err| NpError::Config(format!("invalid {key} value {value}: {err}"))),
        Err(_) => Ok(None),
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::{EvidenceLookup, MacroLookup};
use crate::catalog::{CatalogItem, load_catalog};
use crate::collaborators::HttpCollaborators;
use crate::config::{Config, StorageBackend};
use crate::context::{ContextSnapshot, ProfileTags};
use crate::error::{NpError, Result};
use crate::explain::ExplanationPipeline;
use crate::learning::PreferenceStore;
use crate::ranking::Recommender;
use crate::scoring::novelty_source;
use crate::storage::{JsonFileStore, KeyValueStore, SqliteStore};

const ROOT_DIR: &str = ".nutripick";
const SQLITE_FILE: &str = "nutripick.db";
const JSON_FILE: &str = "store.json";

pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub collaborators: Arc<HttpCollaborators>,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let root = Self::find_root()?;
        let config = Config::load(cli.config.as_deref(), &root)?;
        Self::open(root, config, cli.robot, cli.verbose)
    }

    /// Open the store under `root` and build the collaborator client.
    pub fn open(root: PathBuf, config: Config, robot_mode: bool, verbosity: u8) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        let store: Arc<dyn KeyValueStore> = match config.storage.backend {
            StorageBackend::Sqlite => Arc::new(SqliteStore::open(root.join(SQLITE_FILE))?),
            StorageBackend::Json => Arc::new(JsonFileStore::open(root.join(JSON_FILE))?),
        };
        let collaborators = Arc::new(HttpCollaborators::new(config.collaborators.clone())?);
        debug!(
            root = %root.display(),
            backend = ?config.storage.backend,
            collaborators = collaborators.any_configured(),
            "app context ready"
        );
        Ok(Self {
            root,
            config,
            store,
            collaborators,
            robot_mode,
            verbosity,
        })
    }

    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("NP_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, ROOT_DIR) {
            return Ok(found);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| NpError::MissingConfig("data directory not found".to_string()))?;
        Ok(data_dir.join("nutripick"))
    }

    /// Configured data path, relative paths taken from the root.
    #[must_use]
    pub fn data_path(&self, configured: Option<&Path>, default_name: &str) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.root.join(path),
            None => self.root.join(default_name),
        }
    }

    pub fn load_catalog(&self) -> Result<Vec<CatalogItem>> {
        let path = self.data_path(self.config.data.catalog.as_deref(), "catalog.json");
        if !path.is_file() {
            return Err(NpError::MissingConfig(format!(
                "catalog not found at {} (set NP_CATALOG or [data] catalog)",
                path.display()
            )));
        }
        let items = load_catalog(&path)?;
        info!(path = %path.display(), items = items.len(), "catalog loaded");
        Ok(items)
    }

    /// Current wearable snapshot; an absent file means no context yet.
    pub fn load_context(&self) -> Result<ContextSnapshot> {
        let path = self.data_path(self.config.data.context.as_deref(), "context.json");
        if !path.is_file() {
            debug!(path = %path.display(), "no context snapshot");
            return Ok(ContextSnapshot::default());
        }
        ContextSnapshot::load(&path)
    }

    pub fn load_profile(&self) -> Result<ProfileTags> {
        let path = self.data_path(self.config.data.profile.as_deref(), "profile.json");
        if !path.is_file() {
            debug!(path = %path.display(), "no profile tags");
            return Ok(ProfileTags::default());
        }
        ProfileTags::load(&path)
    }

    pub fn macro_lookup(&self) -> Result<Arc<MacroLookup>> {
        Ok(Arc::new(MacroLookup::load(
            self.store.clone(),
            self.collaborators.clone(),
            self.config.cache.macro_ttl,
        )?))
    }

    /// A ranked session over the configured catalog, context and filters.
    pub fn recommender(&self) -> Result<Recommender> {
        let catalog = self.load_catalog()?;
        let context = self.load_context()?;
        let profile = self.load_profile()?;
        let preferences = PreferenceStore::load(self.store.clone())?;
        let novelty = novelty_source(
            self.config.scoring.novelty_max,
            self.config.scoring.novelty_seed,
        );
        Ok(Recommender::new(
            catalog,
            preferences,
            self.macro_lookup()?,
            novelty,
            self.config.ranking.page_size,
        )
        .with_filter(self.config.filter_prefs())
        .with_context(context, profile))
    }

    pub fn explanation_pipeline(&self) -> Result<ExplanationPipeline> {
        let mut evidence = EvidenceLookup::load(self.store.clone(), self.collaborators.clone())?;
        if let Some(seed) = self.config.scoring.novelty_seed {
            evidence = evidence.with_seed(seed);
        }
        Ok(
            ExplanationPipeline::new(Arc::new(evidence), self.collaborators.clone())
                .with_abstract_limit(self.config.explain.abstract_max_chars),
        )
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(name);
        if candidate.is_dir() {
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::FeedbackSignal;
    use crate::test_utils::fixtures::{
        UnitTestFixture, elevated_context, high_bp_profile, sample_catalog,
    };

    fn context_at(fixture: &UnitTestFixture, config: Config) -> AppContext {
        AppContext::open(fixture.data_path.clone(), config, false, 0).unwrap()
    }

    #[test]
    fn missing_catalog_is_missing_config() {
        let fixture = UnitTestFixture::new();
        let ctx = context_at(&fixture, Config::default());
        let err = ctx.load_catalog().unwrap_err();
        assert!(matches!(err, NpError::MissingConfig(_)));
    }

    #[test]
    fn absent_context_files_default_to_empty() {
        let fixture = UnitTestFixture::new();
        let ctx = context_at(&fixture, Config::default());
        assert_eq!(ctx.load_context().unwrap(), ContextSnapshot::default());
        assert_eq!(ctx.load_profile().unwrap(), ProfileTags::default());
    }

    #[test]
    fn relative_data_paths_resolve_against_root() {
        let fixture = UnitTestFixture::new();
        let ctx = context_at(&fixture, Config::default());
        assert_eq!(
            ctx.data_path(Some(Path::new("menus/today.json")), "catalog.json"),
            fixture.data_path.join("menus/today.json")
        );
        assert_eq!(
            ctx.data_path(Some(Path::new("/abs/menu.json")), "catalog.json"),
            PathBuf::from("/abs/menu.json")
        );
    }

    #[test]
    fn recommender_uses_files_under_root() {
        let fixture = UnitTestFixture::new();
        let _ = fixture.write_catalog(&sample_catalog());
        let _ = fixture.write_context(&elevated_context());
        let _ = fixture.write_profile(&high_bp_profile());
        let mut config = Config::default();
        config.scoring.novelty_max = 0.0;
        let ctx = context_at(&fixture, config);

        let session = ctx.recommender().unwrap();
        assert_eq!(session.catalog().len(), 5);
        assert!(session.profile().has_flag("high-bp"));
        let ranked = session.ranked();
        assert_eq!(ranked[0].item.id, "clear-vegetable-soup");
        assert_eq!(ranked.last().map(|r| r.item.id.as_str()), Some("masala-fries"));
    }

    #[test]
    fn json_backend_persists_feedback_across_contexts() {
        let fixture = UnitTestFixture::new();
        let _ = fixture.write_catalog(&sample_catalog());
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Json;

        let ctx = context_at(&fixture, config.clone());
        let mut session = ctx.recommender().unwrap();
        session.feedback("plain-curd", FeedbackSignal::Like).unwrap();
        session.feedback("moong-dal-khichdi", FeedbackSignal::Like).unwrap();
        assert!(fixture.data_path.join(JSON_FILE).is_file());

        let reopened = context_at(&fixture, config);
        let preferences = PreferenceStore::load(reopened.store.clone()).unwrap();
        assert_eq!(preferences.model().weight("satvik"), 2.0);
        assert_eq!(preferences.bandit().get("satvik").success, 1);
    }
}

//! Collaborator entry points and how they are loaded.

use std::sync::Arc;

use async_trait::async_trait;
use dsr_core::EngineError;
use tracing::info;

use crate::collaborator::{DataFetcher, PageIndex, PageRenderer};
use crate::config::EngineConfig;
use crate::fs::{FsDataFetcher, FsPageIndex, FsRenderer};
use crate::prepare::prepare_filesystem;

/// The collaborator entry points a dispatcher calls into.
///
/// Resolved once during process-wide initialization and shared by every
/// request afterwards.
#[derive(Clone)]
pub struct Engine {
    /// Page metadata lookup.
    pub pages: Arc<dyn PageIndex>,
    /// Render data source.
    pub fetcher: Arc<dyn DataFetcher>,
    /// Document and page-data renderers.
    pub renderer: Arc<dyn PageRenderer>,
}

impl Engine {
    /// Assemble an engine from its collaborators.
    pub fn new(
        pages: Arc<dyn PageIndex>,
        fetcher: Arc<dyn DataFetcher>,
        renderer: Arc<dyn PageRenderer>,
    ) -> Self {
        Self {
            pages,
            fetcher,
            renderer,
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

/// Produces an [`Engine`]; runs at most once per successful initialization.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Prepare whatever the engine needs and resolve its entry points.
    async fn load(&self) -> Result<Engine, EngineError>;
}

/// Loads the filesystem-backed engine from a staged cache directory.
#[derive(Debug, Clone)]
pub struct FsEngineLoader {
    config: EngineConfig,
}

impl FsEngineLoader {
    /// Create a loader for a configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The configuration this loader stages from.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[async_trait]
impl EngineLoader for FsEngineLoader {
    async fn load(&self) -> Result<Engine, EngineError> {
        let config = self.config.clone();
        let cache_dir = config.cache_dir.clone();

        let pages = tokio::task::spawn_blocking(move || {
            prepare_filesystem(&config.source_dir, &config.cache_dir, &config.subsystems)?;
            FsPageIndex::load(&config.cache_dir)
        })
        .await
        .map_err(|e| EngineError::Other(format!("preparation task failed: {}", e)))??;

        let renderer = FsRenderer::load(&cache_dir)?;
        info!(pages = pages.len(), cache_dir = %cache_dir.display(), "engine loaded");

        Ok(Engine::new(
            Arc::new(pages),
            Arc::new(FsDataFetcher::new(&cache_dir)),
            Arc::new(renderer),
        ))
    }
}

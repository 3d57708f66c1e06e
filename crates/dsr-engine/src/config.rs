//! Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::prepare::Subsystem;

/// Where the bundled artifacts live and where they are staged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bundled artifacts shipped with the deployment.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    /// Process-local staging location.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Subsystems staged before the first request.
    #[serde(default = "default_subsystems")]
    pub subsystems: Vec<Subsystem>,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(".cache")
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("dsr").join(".cache")
}

fn default_subsystems() -> Vec<Subsystem> {
    Subsystem::ALL.to_vec()
}

impl EngineConfig {
    /// Create a new engine configuration.
    pub fn new(source_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            cache_dir: cache_dir.into(),
            subsystems: default_subsystems(),
        }
    }

    /// Restrict the staged subsystems.
    pub fn with_subsystems(mut self, subsystems: Vec<Subsystem>) -> Self {
        self.subsystems = subsystems;
        self
    }

    /// Apply `DSR_SOURCE_DIR` / `DSR_CACHE_DIR` overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = std::env::var_os("DSR_SOURCE_DIR") {
            self.source_dir = PathBuf::from(dir);
        }
        if let Some(dir) = std::env::var_os("DSR_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            cache_dir: default_cache_dir(),
            subsystems: default_subsystems(),
        }
    }
}

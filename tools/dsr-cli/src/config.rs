//! CLI configuration.

use anyhow::{Context, Result};
use dsr_engine::EngineConfig;
use dsr_observability::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Config file names, in lookup order.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["dsr.toml", ".dsr.toml", "dsr.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Engine configuration.
    #[serde(default)]
    pub engine: EngineConfig,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(path, &content)
    }

    /// Parse config content, choosing the format from the file name.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content).with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Generate a default dsr.toml config file.
pub fn generate_default_config() -> String {
    r#"# On-demand rendering configuration

[engine]
# Bundled artifacts shipped with the deployment
source_dir = ".cache"
# Process-local staging location
# cache_dir = "/tmp/dsr/.cache"
subsystems = ["data", "page-ssr", "query-engine"]

[server]
host = "127.0.0.1"
port = 8787

[logging]
level = "info"
format = "compact"
"#
    .to_string()
}

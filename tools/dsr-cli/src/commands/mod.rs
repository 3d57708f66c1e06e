//! CLI command implementations.

pub mod classify;
pub mod config;
pub mod prepare;
pub mod render;
pub mod serve;

use clap::{Args, Subcommand};

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind (overrides server.host).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides server.port).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Load the engine before accepting connections.
    #[arg(long)]
    pub eager: bool,
}

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// Request path, e.g. `/about` or `/page-data/about/page-data.json`.
    pub path: String,

    /// Print only the status line and headers.
    #[arg(long)]
    pub no_body: bool,
}

/// Arguments for the classify command.
#[derive(Args)]
pub struct ClassifyArgs {
    /// Request path to classify.
    pub path: String,
}

/// Arguments for the prepare command.
#[derive(Args)]
pub struct PrepareArgs {
    /// Source directory (overrides engine.source_dir).
    #[arg(long)]
    pub source: Option<String>,

    /// Cache directory (overrides engine.cache_dir).
    #[arg(long)]
    pub cache: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration.
    Show,
    /// Write a default dsr.toml.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the configuration.
    Validate,
}

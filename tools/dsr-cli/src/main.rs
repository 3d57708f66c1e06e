//! DSR CLI - Command line tool for the on-demand rendering dispatcher.
//!
//! Commands:
//! - `dsr serve` - Serve on-demand pages over HTTP
//! - `dsr render` - Dispatch a single path and print the response
//! - `dsr classify` - Show how a path is classified
//! - `dsr prepare` - Stage bundled artifacts into the cache directory
//! - `dsr config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dsr_observability::{init_logging, LoggingConfig};

use commands::{ClassifyArgs, ConfigArgs, PrepareArgs, RenderArgs, ServeArgs};

/// DSR CLI - Serve and inspect on-demand rendered pages
#[derive(Parser)]
#[command(name = "dsr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve on-demand pages over HTTP
    Serve(ServeArgs),

    /// Dispatch one request path and print the response
    Render(RenderArgs),

    /// Show the artifact kind and canonical path of a request path
    Classify(ClassifyArgs),

    /// Stage bundled artifacts into the cache directory
    Prepare(PrepareArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    // Only the server logs at the configured level; one-shot commands stay quiet
    let logging = match (&cli.command, cli.verbose) {
        (_, true) => LoggingConfig {
            level: "debug".to_string(),
            ..ctx.config.logging.clone()
        },
        (Commands::Serve(_), false) => ctx.config.logging.clone(),
        (_, false) => LoggingConfig {
            level: "warn".to_string(),
            ..ctx.config.logging.clone()
        },
    };
    if let Err(e) = init_logging(&logging) {
        ctx.output.warn(&format!("Logging disabled: {}", e));
    }

    // Execute command
    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(args, &ctx).await,
        Commands::Render(args) => commands::render::run(args, &ctx).await,
        Commands::Classify(args) => commands::classify::run(args, &ctx).await,
        Commands::Prepare(args) => commands::prepare::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

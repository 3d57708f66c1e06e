//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use dialoguer::Confirm;
use dsr_engine::Subsystem;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, CONFIG_FILE_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    let engine = ctx.engine_config();

    if ctx.output.is_json() {
        let mut effective = ctx.config.clone();
        effective.engine = engine;
        ctx.output.json(&effective);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match ctx.config_path {
        Some(ref path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    // Engine section
    ctx.output.info("");
    ctx.output.info("[engine]");
    ctx.output.kv("source_dir", &engine.source_dir.display().to_string());
    ctx.output.kv("cache_dir", &engine.cache_dir.display().to_string());
    let subsystems: Vec<String> = engine.subsystems.iter().map(|s| s.to_string()).collect();
    ctx.output.kv("subsystems", &subsystems.join(", "));

    // Server section
    ctx.output.info("");
    ctx.output.info("[server]");
    ctx.output.kv("host", &ctx.config.server.host);
    ctx.output.kv("port", &ctx.config.server.port.to_string());

    // Logging section
    ctx.output.info("");
    ctx.output.info("[logging]");
    ctx.output.kv("level", &ctx.config.logging.level);
    ctx.output.kv("format", &ctx.config.logging.format.to_string());

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        let interactive = console::Term::stderr().is_term() && !ctx.output.is_json();
        let overwrite = interactive
            && Confirm::new()
                .with_prompt(format!("{} exists. Overwrite?", config_path.display()))
                .default(false)
                .interact()?;
        if !overwrite {
            bail!(
                "Config file already exists: {}. Use --force to overwrite.",
                config_path.display()
            );
        }
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, mut warnings) = check_config(&ctx.config);
    let engine = ctx.engine_config();
    if !engine.source_dir.exists() {
        warnings.push(format!(
            "engine.source_dir '{}' does not exist",
            engine.source_dir.display()
        ));
    }

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Collect configuration errors and warnings.
fn check_config(config: &CliConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !config.engine.subsystems.contains(&Subsystem::QueryEngine) {
        errors.push("engine.subsystems must include query-engine (the page index)".to_string());
    }
    for subsystem in [Subsystem::Data, Subsystem::PageSsr] {
        if !config.engine.subsystems.contains(&subsystem) {
            warnings.push(format!("engine.subsystems does not stage {}", subsystem));
        }
    }
    if config.engine.source_dir == config.engine.cache_dir {
        errors.push("engine.cache_dir must differ from engine.source_dir".to_string());
    }

    if config.server.host.is_empty() {
        errors.push("server.host is required".to_string());
    }
    if config.server.port == 0 {
        warnings.push("server.port 0 binds a random port".to_string());
    }

    if let Err(e) = config.logging.level_filter() {
        errors.push(format!("logging.level: {}", e));
    }

    (errors, warnings)
}

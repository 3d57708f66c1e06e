//! Stage bundled artifacts into the cache directory.

use std::path::Path;

use anyhow::{Context as _, Result};
use dsr_engine::prepare_filesystem;

use super::PrepareArgs;
use crate::context::Context;

/// Run the prepare command.
pub async fn run(args: PrepareArgs, ctx: &Context) -> Result<()> {
    let mut engine = ctx.engine_config();
    if let Some(ref source) = args.source {
        engine.source_dir = ctx.resolve_path(Path::new(source));
    }
    if let Some(ref cache) = args.cache {
        engine.cache_dir = ctx.resolve_path(Path::new(cache));
    }

    ctx.output.header("Preparing filesystem");
    ctx.output.debug(&format!("source: {}", engine.source_dir.display()));
    ctx.output.debug(&format!("cache: {}", engine.cache_dir.display()));

    let spinner = ctx.output.spinner("Staging subsystems...");
    let result = tokio::task::spawn_blocking(move || {
        prepare_filesystem(&engine.source_dir, &engine.cache_dir, &engine.subsystems)
    })
    .await
    .context("Preparation task panicked")?;
    spinner.finish_and_clear();

    let report = result.context("Failed to prepare filesystem")?;

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    for subsystem in &report.staged {
        ctx.output.list_item(&format!("{} staged", subsystem));
    }
    for subsystem in &report.already_present {
        ctx.output.list_item(&format!("{} already present", subsystem));
    }
    ctx.output.kv("cache", &report.cache_dir.display().to_string());
    ctx.output.kv("prepared at", &report.prepared_at.to_rfc3339());

    ctx.output.success(&format!(
        "Prepared {} subsystem(s), {} already in place",
        report.staged.len(),
        report.already_present.len()
    ));

    Ok(())
}

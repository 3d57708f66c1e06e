//! Dispatch a single request path.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use dsr_core::Response;
use dsr_dispatch::Runtime;
use dsr_engine::FsEngineLoader;
use dsr_observability::MetricsCollector;
use serde_json::json;

use super::RenderArgs;
use crate::context::Context;
use crate::output::{format_bytes, status_badge};

/// Run the render command.
pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let metrics = Arc::new(MetricsCollector::retaining());
    let runtime = Runtime::new(Arc::new(FsEngineLoader::new(ctx.engine_config())))
        .with_observer(metrics.clone());

    let spinner = ctx.output.spinner("Loading engine...");
    let initialized = runtime.ensure_initialized().await;
    spinner.finish_and_clear();
    initialized.context("Failed to load engine")?;

    let response = runtime
        .handle(&args.path)
        .await
        .with_context(|| format!("Failed to render {}", args.path))?;
    let dispatch = metrics.take().pop();

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "path": args.path,
            "response": response,
            "metrics": dispatch,
        }));
        return ensure_served(&args.path, &response);
    }

    ctx.output.header(&args.path);
    ctx.output.kv("status", &status_badge(response.status));
    for (name, value) in &response.headers {
        ctx.output.kv(name, value);
    }
    ctx.output.kv("size", &format_bytes(response.body.len() as u64));

    if ctx.output.is_verbose() {
        if let Some(dispatch) = &dispatch {
            ctx.output.debug(&dispatch.to_summary());
        }
    }

    if !args.no_body {
        ctx.output.raw("");
        ctx.output.raw(&response.body);
    }

    ensure_served(&args.path, &response)
}

/// Fail the command when the path is not served on demand.
fn ensure_served(path: &str, response: &Response) -> Result<()> {
    if !response.is_success() {
        bail!("{} is not served on demand (status {})", path, response.status);
    }
    Ok(())
}

//! Serve on-demand pages over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use dsr_dispatch::{build_not_found, Runtime};
use dsr_engine::FsEngineLoader;
use dsr_observability::MetricsCollector;
use percent_encoding::percent_decode_str;
use tracing::{debug, error, info};

use super::ServeArgs;
use crate::context::Context;

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let host = args.host.unwrap_or_else(|| ctx.config.server.host.clone());
    let port = args.port.unwrap_or(ctx.config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address: {}:{}", host, port))?;

    let runtime = Arc::new(
        Runtime::new(Arc::new(FsEngineLoader::new(ctx.engine_config())))
            .with_observer(Arc::new(MetricsCollector::new())),
    );

    if args.eager {
        let spinner = ctx.output.spinner("Loading engine...");
        let initialized = runtime.ensure_initialized().await;
        spinner.finish_and_clear();
        initialized.context("Failed to load engine")?;
        ctx.output.success("Engine loaded");
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    ctx.output.success(&format!("Listening on http://{}", addr));
    info!(address = %addr, "starting server");

    axum::serve(listener, router(runtime))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Router sending every path to the runtime.
pub fn router(runtime: Arc<Runtime>) -> Router {
    Router::new().fallback(dispatch).with_state(runtime)
}

async fn dispatch(State(runtime): State<Arc<Runtime>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD")],
            "Method not allowed",
        )
            .into_response();
    }

    let Ok(path) = percent_decode_str(uri.path()).decode_utf8() else {
        debug!(path = %uri.path(), "request path is not valid UTF-8");
        return not_found();
    };

    let result = runtime
        .handle(&path)
        .await
        .map_err(|e| e.to_string())
        .and_then(|response| response.into_http().map_err(|e| e.to_string()));

    match result {
        Ok(response) => response.into_response(),
        Err(reason) => {
            error!(path = %path, error = %reason, "dispatch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "Internal server error",
            )
                .into_response()
        }
    }
}

fn not_found() -> Response {
    match build_not_found().into_http() {
        Ok(response) => response.into_response(),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received, stopping server");
}

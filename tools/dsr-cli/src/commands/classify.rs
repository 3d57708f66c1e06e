//! Show how a request path is classified.

use anyhow::Result;
use dsr_core::ArtifactKind;
use dsr_dispatch::{page_data_path, RequestedArtifact};
use serde_json::json;

use super::ClassifyArgs;
use crate::context::Context;

/// Run the classify command.
pub async fn run(args: ClassifyArgs, ctx: &Context) -> Result<()> {
    let artifact = RequestedArtifact::from_path(&args.path);

    // Documents have a page-data companion; page-data paths point back at a document.
    let companion = match (artifact.kind, artifact.canonical_path.is_empty()) {
        (_, true) => None,
        (ArtifactKind::Document, false) => Some(page_data_path(&artifact.canonical_path)),
        (ArtifactKind::PageData, false) => Some(artifact.canonical_path.clone()),
    };

    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "path": args.path,
            "artifact": artifact.kind,
            "canonical_path": artifact.canonical_path,
            "content_type": artifact.kind.content_type(),
            "companion": companion,
        }));
        return Ok(());
    }

    ctx.output.header(&args.path);
    ctx.output.kv("artifact", artifact.kind.name());
    ctx.output.kv("content-type", artifact.kind.content_type());
    if artifact.canonical_path.is_empty() {
        ctx.output.kv("canonical path", "(none)");
        ctx.output
            .warn("No page can match this path; it is always answered with 404");
    } else {
        ctx.output.kv("canonical path", &artifact.canonical_path);
    }
    if let Some(companion) = companion {
        ctx.output.kv("companion", &companion);
    }

    Ok(())
}

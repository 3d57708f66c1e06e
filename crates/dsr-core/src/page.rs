//! Page metadata as supplied by the page index.

use serde::{Deserialize, Serialize};

/// Opaque payload produced by the data fetcher and consumed by the renderer.
///
/// The dispatcher passes it through without inspecting its shape.
pub type RenderData = serde_json::Value;

/// How a page is rendered.
///
/// Serialized with the tags the site build writes into its page index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RenderMode {
    /// Deferred: rendered at request time by this dispatcher.
    OnDemand,
    /// Pre-rendered at build time.
    Static,
    /// Server-side rendered by a different function.
    ServerSide,
    /// Any tag this dispatcher does not know about.
    Other(String),
}

impl RenderMode {
    /// Tag as written in the page index.
    pub fn as_str(&self) -> &str {
        match self {
            Self::OnDemand => "DSR",
            Self::Static => "SSG",
            Self::ServerSide => "SSR",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for RenderMode {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "DSR" | "on-demand" => Self::OnDemand,
            "SSG" | "static" => Self::Static,
            "SSR" | "server" => Self::ServerSide,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for RenderMode {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<RenderMode> for String {
    fn from(mode: RenderMode) -> Self {
        mode.as_str().to_string()
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statically known page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Canonical page path (e.g. `/about`).
    pub path: String,
    /// Render mode tag.
    pub mode: RenderMode,
    /// Name of the page component's chunk, echoed into page-data payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_chunk_name: Option<String>,
    /// Build-time page context.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub context: serde_json::Value,
}

impl PageRecord {
    /// Create a new page record.
    pub fn new(path: impl Into<String>, mode: impl Into<RenderMode>) -> Self {
        Self {
            path: path.into(),
            mode: mode.into(),
            component_chunk_name: None,
            context: serde_json::Value::Null,
        }
    }

    /// Set the component chunk name.
    pub fn with_component(mut self, chunk: impl Into<String>) -> Self {
        self.component_chunk_name = Some(chunk.into());
        self
    }

    /// Set the page context.
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = context;
        self
    }
}

//! Collaborator interfaces consumed by the dispatcher.

use async_trait::async_trait;
use dsr_core::{EngineError, PageRecord, RenderData};

/// Lookup of page records by canonical path.
pub trait PageIndex: Send + Sync {
    /// Find the page registered under `path`, if any.
    fn find_page_by_path(&self, path: &str) -> Option<PageRecord>;
}

/// Input to a data fetch.
#[derive(Clone, Copy)]
pub struct FetchRequest<'a> {
    /// Canonical page path.
    pub path: &'a str,
    /// Handle to the page index the page was resolved from.
    pub index: &'a dyn PageIndex,
}

/// Gathers the data needed to render a page.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    /// Fetch render data for a page.
    async fn fetch_data(&self, request: FetchRequest<'_>) -> Result<RenderData, EngineError>;
}

/// Turns render data into a document or a page-data payload.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render the full HTML document.
    async fn render_html(&self, data: &RenderData) -> Result<String, EngineError>;

    /// Render the page-data payload; the dispatcher serializes it.
    async fn render_page_data(&self, data: &RenderData) -> Result<serde_json::Value, EngineError>;
}

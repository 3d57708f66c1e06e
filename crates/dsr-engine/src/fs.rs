//! Filesystem-backed collaborators reading the staged cache directory.
//!
//! Layout under the cache root:
//!
//! ```text
//! query-engine/pages.json   array of page records
//! data/<page>.json          render data per page (`index.json` for `/`)
//! page-ssr/template.html    document template (optional)
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dsr_core::{EngineError, PageRecord, RenderData};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::collaborator::{DataFetcher, FetchRequest, PageIndex, PageRenderer};
use crate::prepare::Subsystem;

/// File holding the page index inside the query-engine subsystem.
pub const PAGES_FILE: &str = "pages.json";

/// File holding the document template inside the page-ssr subsystem.
pub const TEMPLATE_FILE: &str = "template.html";

/// Template used when the bundle ships none.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{title}}</title>
</head>
<body>
<div id="___app">{{content}}</div>
<script id="page-data" type="application/json">{{page_data}}</script>
</body>
</html>
"#;

/// Page index loaded from `query-engine/pages.json`.
#[derive(Debug, Default)]
pub struct FsPageIndex {
    pages: HashMap<String, PageRecord>,
}

impl FsPageIndex {
    /// Build an index from page records.
    pub fn from_pages(pages: impl IntoIterator<Item = PageRecord>) -> Self {
        Self {
            pages: pages.into_iter().map(|p| (p.path.clone(), p)).collect(),
        }
    }

    /// Load the index from a staged cache root.
    pub fn load(cache_dir: &Path) -> Result<Self, EngineError> {
        let path = cache_dir
            .join(Subsystem::QueryEngine.dir_name())
            .join(PAGES_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| EngineError::io(&path, e))?;
        let pages: Vec<PageRecord> =
            serde_json::from_str(&content).map_err(|e| EngineError::json(&path, e))?;
        Ok(Self::from_pages(pages))
    }

    /// Number of indexed pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl PageIndex for FsPageIndex {
    /// Exact match first, then the same path with its trailing slash toggled.
    fn find_page_by_path(&self, path: &str) -> Option<PageRecord> {
        if path.is_empty() {
            return None;
        }
        if let Some(page) = self.pages.get(path) {
            return Some(page.clone());
        }
        if path == "/" {
            return None;
        }

        let alternate = match path.strip_suffix('/') {
            Some(trimmed) => trimmed.to_string(),
            None => format!("{}/", path),
        };
        self.pages.get(&alternate).cloned()
    }
}

/// Render data produced by [`FsDataFetcher`] and understood by [`FsRenderer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsRenderData {
    /// The resolved page.
    pub page: PageRecord,
    /// Contents of the page's data file (`null` when it has none).
    pub data: serde_json::Value,
}

/// Fetches render data from `data/<page>.json`.
#[derive(Debug, Clone)]
pub struct FsDataFetcher {
    data_dir: PathBuf,
}

impl FsDataFetcher {
    /// Create a fetcher reading from a staged cache root.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            data_dir: cache_dir.join(Subsystem::Data.dir_name()),
        }
    }
}

/// Relative data file for a canonical page path.
///
/// Returns `None` for paths that would escape the data directory.
pub fn data_file_for(path: &str) -> Option<PathBuf> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Some(PathBuf::from("index.json"));
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == ".." || s.contains('\\'))
    {
        return None;
    }

    let (last, parents) = segments.split_last()?;
    let mut file: PathBuf = parents.iter().collect();
    file.push(format!("{}.json", last));
    Some(file)
}

#[async_trait]
impl DataFetcher for FsDataFetcher {
    async fn fetch_data(&self, request: FetchRequest<'_>) -> Result<RenderData, EngineError> {
        let page = request
            .index
            .find_page_by_path(request.path)
            .ok_or_else(|| EngineError::MissingData(request.path.to_string()))?;
        let relative =
            data_file_for(request.path).ok_or_else(|| EngineError::MissingData(request.path.to_string()))?;
        let file = self.data_dir.join(relative);

        let data = match tokio::fs::read_to_string(&file).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| EngineError::json(&file, e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::Value::Null,
            Err(e) => return Err(EngineError::io(&file, e)),
        };

        serde_json::to_value(FsRenderData { page, data })
            .map_err(|e| EngineError::Other(format!("failed to encode render data: {}", e)))
    }
}

/// Renders documents from a template and page-data payloads from render data.
#[derive(Debug, Clone)]
pub struct FsRenderer {
    template: String,
}

impl FsRenderer {
    /// Create a renderer with an explicit template.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load `page-ssr/template.html` from a staged cache root, falling back
    /// to [`DEFAULT_TEMPLATE`].
    pub fn load(cache_dir: &Path) -> Result<Self, EngineError> {
        let path = cache_dir.join(Subsystem::PageSsr.dir_name()).join(TEMPLATE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(template) => Ok(Self::with_template(template)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::with_template(DEFAULT_TEMPLATE))
            }
            Err(e) => Err(EngineError::io(&path, e)),
        }
    }

    fn decode(data: &RenderData) -> Result<FsRenderData, EngineError> {
        FsRenderData::deserialize(data)
            .map_err(|e| EngineError::Other(format!("unexpected render data: {}", e)))
    }

    fn page_data(render: &FsRenderData) -> serde_json::Value {
        json!({
            "componentChunkName": render.page.component_chunk_name,
            "path": render.page.path,
            "result": {
                "data": render.data,
                "pageContext": render.page.context,
            },
            "staticQueryHashes": [],
        })
    }
}

#[async_trait]
impl PageRenderer for FsRenderer {
    async fn render_html(&self, data: &RenderData) -> Result<String, EngineError> {
        let render = Self::decode(data)?;
        let title = render
            .data
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let content = render
            .data
            .get("html")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        // Inline JSON must not close the surrounding script element.
        let page_data = Self::page_data(&render).to_string().replace("</", "<\\/");

        Ok(self
            .template
            .replace("{{title}}", &html_escape(title))
            .replace("{{content}}", content)
            .replace("{{page_data}}", &page_data))
    }

    async fn render_page_data(&self, data: &RenderData) -> Result<serde_json::Value, EngineError> {
        let render = Self::decode(data)?;
        Ok(Self::page_data(&render))
    }
}

/// Simple HTML escape for text content.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

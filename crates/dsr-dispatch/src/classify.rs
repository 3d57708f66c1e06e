//! Request path classification.

use dsr_core::ArtifactKind;

/// Leading part of every page-data path.
pub const PAGE_DATA_PREFIX: &str = "/page-data/";

/// Trailing part of every page-data path.
pub const PAGE_DATA_SUFFIX: &str = "/page-data.json";

/// Page-data segment naming the root page.
const INDEX_SEGMENT: &str = "index";

/// Classify a request path.
///
/// A path names a page-data payload iff it starts with [`PAGE_DATA_PREFIX`]
/// and ends with [`PAGE_DATA_SUFFIX`]; anything else is a document request.
pub fn classify(path: &str) -> ArtifactKind {
    if path.starts_with(PAGE_DATA_PREFIX) && path.ends_with(PAGE_DATA_SUFFIX) {
        ArtifactKind::PageData
    } else {
        ArtifactKind::Document
    }
}

/// Recover the canonical page path from a page-data path.
///
/// Strips the prefix and suffix once each and restores the leading slash;
/// `index` maps to `/`. When prefix and suffix overlap there is no page
/// segment and the result is empty, which no page index resolves.
pub fn normalize(path: &str) -> String {
    let inner = path
        .strip_prefix(PAGE_DATA_PREFIX)
        .and_then(|rest| rest.strip_suffix(PAGE_DATA_SUFFIX));

    match inner {
        Some("") | None => String::new(),
        Some(INDEX_SEGMENT) => "/".to_string(),
        Some(inner) => format!("/{}", inner),
    }
}

/// Build the page-data path for a canonical page path.
pub fn page_data_path(canonical: &str) -> String {
    let trimmed = canonical.trim_matches('/');
    let segment = if trimmed.is_empty() { INDEX_SEGMENT } else { trimmed };
    format!("{}{}{}", PAGE_DATA_PREFIX, segment, PAGE_DATA_SUFFIX)
}

/// A classified request: what is asked for and for which page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedArtifact {
    /// Artifact kind, fixed at classification time.
    pub kind: ArtifactKind,
    /// Canonical page path to resolve.
    pub canonical_path: String,
}

impl RequestedArtifact {
    /// Classify a path and normalize it when it names page data.
    pub fn from_path(path: &str) -> Self {
        let kind = classify(path);
        let canonical_path = match kind {
            ArtifactKind::PageData => normalize(path),
            ArtifactKind::Document => path.to_string(),
        };
        Self {
            kind,
            canonical_path,
        }
    }
}

//! Request identity and artifact classification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

impl RequestId {
    /// Generate a new request ID.
    ///
    /// Unique within a process: a nanosecond timestamp plus a monotonic sequence.
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of artifact a request path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// The page's serialized data payload (`/page-data/<path>/page-data.json`).
    PageData,
    /// The page's full HTML document.
    Document,
}

impl ArtifactKind {
    /// Content-Type of a successful response for this artifact.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::PageData => "application/json",
            Self::Document => "text/html; charset=utf-8",
        }
    }

    /// Short name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PageData => "page-data",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single dispatch invocation.
///
/// Created per request and discarded once the response is produced.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// Request path as received.
    pub path: String,
}

impl Request {
    /// Create a new request for a path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::generate(),
            path: path.into(),
        }
    }

    /// Attach an existing request ID (e.g. from an upstream header).
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_artifact_content_types() {
        assert_eq!(ArtifactKind::PageData.content_type(), "application/json");
        assert_eq!(
            ArtifactKind::Document.content_type(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn test_request_keeps_supplied_id() {
        let req = Request::new("/about").with_request_id(RequestId::from_string("abc"));
        assert_eq!(req.request_id.as_str(), "abc");
        assert_eq!(req.path, "/about");
    }
}

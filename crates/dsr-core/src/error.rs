//! Error types for collaborators and dispatch.

/// Errors raised by external collaborators (page index, fetcher, renderers).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing subsystem '{0}' in bundle")]
    MissingSubsystem(String),

    #[error("No render data for page '{0}'")]
    MissingData(String),

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Wrap a JSON error with the path it concerns.
    pub fn json(path: impl AsRef<std::path::Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Failures that escape a dispatch.
///
/// Missing and ineligible pages are not errors; they produce a 404 response.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Initialization failed: {0}")]
    Init(#[source] EngineError),

    #[error("Data fetch failed for '{path}': {source}")]
    Fetch {
        path: String,
        #[source]
        source: EngineError,
    },

    #[error("Render failed for '{path}': {source}")]
    Render {
        path: String,
        #[source]
        source: EngineError,
    },

    #[error("Page-data serialization failed for '{path}': {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

//! Response header assembly.

/// Header names emitted by the dispatcher.
pub mod header_names {
    /// Content-derived validation token.
    pub const ETAG: &str = "ETag";
    /// Media type of the body.
    pub const CONTENT_TYPE: &str = "Content-Type";
}

/// Content-Type of the not-found response.
pub const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Builder for response headers.
///
/// Emits headers in a fixed order (`ETag` before `Content-Type`) so that
/// identical responses serialize identically.
#[derive(Debug, Default)]
pub struct ResponseHeadersBuilder {
    etag: Option<String>,
    content_type: Option<String>,
}

impl ResponseHeadersBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ETag header (already quoted).
    pub fn etag(mut self, value: impl Into<String>) -> Self {
        self.etag = Some(value.into());
        self
    }

    /// Set the Content-Type header.
    pub fn content_type(mut self, value: impl Into<String>) -> Self {
        self.content_type = Some(value.into());
        self
    }

    /// Build the headers.
    pub fn build(self) -> Vec<(String, String)> {
        let mut headers = Vec::with_capacity(2);

        if let Some(etag) = self.etag {
            headers.push((header_names::ETAG.to_string(), etag));
        }

        if let Some(ct) = self.content_type {
            headers.push((header_names::CONTENT_TYPE.to_string(), ct));
        }

        headers
    }
}

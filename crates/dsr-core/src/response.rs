//! Dispatcher responses.

use serde::Serialize;

/// A response produced by the dispatcher.
///
/// Headers are kept in insertion order with names stored as given; lookups
/// are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response body.
    pub body: String,
    /// The response headers.
    pub headers: Vec<(String, String)>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: impl Into<String>, headers: Vec<(String, String)>) -> Self {
        Self {
            status,
            body: body.into(),
            headers,
        }
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Get the ETag header.
    pub fn etag(&self) -> Option<&str> {
        self.header("ETag")
    }

    /// Convert into an `http::Response` for the hosting runtime.
    pub fn into_http(self) -> Result<http::Response<String>, http::Error> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(self.body)
    }
}

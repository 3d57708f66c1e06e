//! Response assembly.

use dsr_cache::{generate_etag, ResponseHeadersBuilder, PLAIN_TEXT};
use dsr_core::Response;

/// Body of every not-found response.
pub const NOT_FOUND_BODY: &str = "Page not found";

/// Build a 200 response carrying a content-derived ETag.
pub fn build_success(body: String, content_type: &str) -> Response {
    let headers = ResponseHeadersBuilder::new()
        .etag(generate_etag(&body))
        .content_type(content_type)
        .build();
    Response::new(200, body, headers)
}

/// Build the 404 response shared by missing and ineligible pages.
pub fn build_not_found() -> Response {
    let headers = ResponseHeadersBuilder::new().content_type(PLAIN_TEXT).build();
    Response::new(404, NOT_FOUND_BODY, headers)
}

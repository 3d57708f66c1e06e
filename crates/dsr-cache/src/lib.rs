//! Cache-validation infrastructure for the on-demand rendering dispatcher.
//!
//! This crate provides:
//! - `generate_etag` - Content-derived entity tags
//! - `ResponseHeadersBuilder` - Ordered response header assembly
//!
//! # Example
//!
//! ```
//! use dsr_cache::{generate_etag, ResponseHeadersBuilder};
//!
//! let body = "<html></html>";
//! let headers = ResponseHeadersBuilder::new()
//!     .etag(generate_etag(body))
//!     .content_type("text/html; charset=utf-8")
//!     .build();
//!
//! assert_eq!(headers[0].0, "ETag");
//! ```

mod etag;
mod headers;

pub use etag::*;
pub use headers::*;

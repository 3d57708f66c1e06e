//! On-demand rendering dispatch.
//!
//! This crate decides what a request path asks for and whether it is served:
//! - `classify` / `normalize` - Page-data vs document paths
//! - `is_eligible` - The render-mode gate
//! - `build_success` / `build_not_found` - Response assembly
//! - `Dispatcher` - Orchestration of resolve, gate, fetch and render
//! - `Runtime` - One-shot engine initialization in front of the dispatcher

mod classify;
mod dispatcher;
mod gate;
mod response;
mod runtime;

pub use classify::*;
pub use dispatcher::*;
pub use gate::*;
pub use response::*;
pub use runtime::*;

//! Core types for the on-demand rendering dispatcher.
//!
//! This crate provides the fundamental types shared by every layer:
//! - `Request` / `RequestId` - A single dispatch invocation
//! - `PageRecord` / `RenderMode` - Page metadata owned by the page index
//! - `Response` - Status, body and headers produced by the dispatcher
//! - `DispatchPhase` / `LifecycleObserver` - Request lifecycle tracking
//! - `EngineError` / `DispatchError` - Failure taxonomy

mod context;
mod error;
mod lifecycle;
mod page;
mod response;

pub use context::*;
pub use error::*;
pub use lifecycle::*;
pub use page::*;
pub use response::*;

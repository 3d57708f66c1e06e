//! Rendering collaborators for the on-demand rendering dispatcher.
//!
//! This crate provides:
//! - `PageIndex`, `DataFetcher`, `PageRenderer` - Collaborator interfaces
//! - `Engine` - The collaborator entry points, resolved once per process
//! - `EngineLoader` / `FsEngineLoader` - How an `Engine` is produced
//! - `prepare_filesystem` - Staging of bundled artifacts into the cache directory
//! - `FsPageIndex`, `FsDataFetcher`, `FsRenderer` - Filesystem-backed collaborators

mod collaborator;
mod config;
mod engine;
mod fs;
mod prepare;

pub use collaborator::*;
pub use config::*;
pub use engine::*;
pub use fs::*;
pub use prepare::*;

//! Observability infrastructure for the on-demand rendering dispatcher.
//!
//! This crate provides:
//! - `init_logging` / `LoggingConfig` - Global tracing subscriber install
//! - `MetricsCollector` - A lifecycle observer producing `DispatchMetrics`

#![warn(missing_docs)]

mod error;
mod logging;
mod metrics;

pub use error::*;
pub use logging::*;
pub use metrics::*;

// Re-export the observer seam from dsr-core for convenience
pub use dsr_core::{LifecycleObserver, RequestId};

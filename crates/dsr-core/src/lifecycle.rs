//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::context::{ArtifactKind, RequestId};

/// Lifecycle phases for a dispatch.
///
/// `NotFound` and `Ineligible` resolutions jump straight to `Responded`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPhase {
    /// The request path has been classified.
    Classified(ArtifactKind),
    /// The page index has been consulted.
    Resolved {
        /// Whether a page record exists for the canonical path.
        found: bool,
    },
    /// The mode gate has been evaluated on a found record.
    Gated {
        /// Whether the record is rendered on demand.
        eligible: bool,
    },
    /// Render data has been fetched.
    Fetched,
    /// The artifact has been rendered.
    Rendered,
    /// A response has been assembled.
    Responded(u16),
    /// A collaborator failed and the error propagates to the caller, or the
    /// dispatch was dropped before responding (`cancelled`).
    Failed(String),
}

impl DispatchPhase {
    /// Short name used in logs and timing marks.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Classified(_) => "classified",
            Self::Resolved { .. } => "resolved",
            Self::Gated { .. } => "gated",
            Self::Fetched => "fetched",
            Self::Rendered => "rendered",
            Self::Responded(_) => "responded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time between two marks.
    pub fn between(&self, from: &str, to: &str) -> Option<Duration> {
        let from = self.marks.get(from)?;
        let to = self.marks.get(to)?;
        Some(to.saturating_duration_since(*from))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for lifecycle events.
pub trait LifecycleObserver: Send + Sync {
    /// Called when a dispatch enters a phase.
    fn on_phase(&self, request_id: &RequestId, phase: &DispatchPhase, elapsed: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_between_marks() {
        let mut timing = TimingContext::new();
        timing.mark("classified");
        timing.mark("fetched");

        assert!(timing.between("classified", "fetched").is_some());
        assert!(timing.between("classified", "rendered").is_none());
        assert!(timing.between("classified", "fetched").unwrap() <= timing.elapsed());
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(DispatchPhase::Classified(ArtifactKind::Document).name(), "classified");
        assert_eq!(DispatchPhase::Gated { eligible: false }.name(), "gated");
        assert_eq!(DispatchPhase::Responded(404).name(), "responded");
    }
}

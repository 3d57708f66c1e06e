//! Per-request dispatch metrics.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dsr_core::{ArtifactKind, DispatchPhase, LifecycleObserver, RequestId};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// A 200 response was produced.
    Served,
    /// No page record matched the canonical path.
    NotFound,
    /// The page exists but is not rendered on demand.
    Ineligible,
    /// A collaborator failed or the dispatch was cancelled.
    Failed,
}

impl DispatchOutcome {
    /// Name used in metric events and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Served => "served",
            Self::NotFound => "not_found",
            Self::Ineligible => "ineligible",
            Self::Failed => "failed",
        }
    }
}

/// Timings and outcome of a single dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchMetrics {
    /// Request ID for correlation.
    pub request_id: String,
    /// Requested artifact, absent if the dispatch ended before classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactKind>,
    /// How the dispatch ended.
    pub outcome: DispatchOutcome,
    /// HTTP status, absent when the dispatch failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Data fetch duration (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_us: Option<u64>,
    /// Render duration (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_us: Option<u64>,
    /// Total dispatch duration (microseconds).
    pub total_us: u64,
    /// Failure reason; `cancelled` when the dispatch was dropped mid-flight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchMetrics {
    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Request: {}", self.request_id));
        lines.push(format!("  Outcome: {}", self.outcome.as_str()));

        if let Some(artifact) = self.artifact {
            lines.push(format!("  Artifact: {}", artifact));
        }
        if let Some(fetch) = self.fetch_us {
            lines.push(format!("  Fetch: {}us ({:.2}ms)", fetch, fetch as f64 / 1000.0));
        }
        if let Some(render) = self.render_us {
            lines.push(format!("  Render: {}us ({:.2}ms)", render, render as f64 / 1000.0));
        }
        lines.push(format!(
            "  Total: {}us ({:.2}ms)",
            self.total_us,
            self.total_us as f64 / 1000.0
        ));
        if let Some(error) = &self.error {
            lines.push(format!("  Error: {}", error));
        }

        lines.join("\n")
    }
}

#[derive(Debug, Default)]
struct InFlight {
    artifact: Option<ArtifactKind>,
    outcome: Option<DispatchOutcome>,
    gated_at: Option<Duration>,
    fetched_at: Option<Duration>,
    fetch: Option<Duration>,
    render: Option<Duration>,
}

/// Builds [`DispatchMetrics`] from lifecycle phases.
///
/// Every completed dispatch emits one `dsr::metrics` event. With
/// [`MetricsCollector::retaining`] the metrics are also kept for
/// [`MetricsCollector::take`].
#[derive(Debug, Default)]
pub struct MetricsCollector {
    in_flight: Mutex<HashMap<RequestId, InFlight>>,
    completed: Mutex<Vec<DispatchMetrics>>,
    retain: bool,
}

impl MetricsCollector {
    /// Create a collector that only emits events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector that also keeps completed metrics.
    pub fn retaining() -> Self {
        Self {
            retain: true,
            ..Self::default()
        }
    }

    /// Drain the retained metrics.
    pub fn take(&self) -> Vec<DispatchMetrics> {
        std::mem::take(&mut *lock(&self.completed))
    }

    /// Number of dispatches that have started but not completed.
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    fn complete(
        &self,
        request_id: &RequestId,
        state: InFlight,
        status: Option<u16>,
        error: Option<String>,
        total: Duration,
    ) {
        let outcome = match (state.outcome, &error) {
            (_, Some(_)) => DispatchOutcome::Failed,
            (Some(outcome), None) => outcome,
            (None, None) => DispatchOutcome::Served,
        };

        let metrics = DispatchMetrics {
            request_id: request_id.to_string(),
            artifact: state.artifact,
            outcome,
            status,
            fetch_us: state.fetch.map(|d| d.as_micros() as u64),
            render_us: state.render.map(|d| d.as_micros() as u64),
            total_us: total.as_micros() as u64,
            error,
        };

        info!(
            target: "dsr::metrics",
            request_id = %metrics.request_id,
            outcome = metrics.outcome.as_str(),
            status = metrics.status,
            fetch_us = metrics.fetch_us,
            render_us = metrics.render_us,
            total_us = metrics.total_us,
            "dispatch completed"
        );

        if self.retain {
            lock(&self.completed).push(metrics);
        }
    }
}

impl LifecycleObserver for MetricsCollector {
    fn on_phase(&self, request_id: &RequestId, phase: &DispatchPhase, elapsed: Duration) {
        let mut in_flight = lock(&self.in_flight);

        let finished = match phase {
            DispatchPhase::Responded(status) => Some((Some(*status), None)),
            DispatchPhase::Failed(reason) => Some((None, Some(reason.clone()))),
            _ => None,
        };
        if let Some((status, error)) = finished {
            let state = in_flight.remove(request_id).unwrap_or_default();
            drop(in_flight);
            self.complete(request_id, state, status, error, elapsed);
            return;
        }

        let state = in_flight.entry(request_id.clone()).or_default();
        match phase {
            DispatchPhase::Classified(kind) => state.artifact = Some(*kind),
            DispatchPhase::Resolved { found: false } => {
                state.outcome = Some(DispatchOutcome::NotFound)
            }
            DispatchPhase::Gated { eligible } => {
                state.gated_at = Some(elapsed);
                if !eligible {
                    state.outcome = Some(DispatchOutcome::Ineligible);
                }
            }
            DispatchPhase::Fetched => {
                state.fetched_at = Some(elapsed);
                state.fetch = state.gated_at.map(|start| elapsed.saturating_sub(start));
            }
            DispatchPhase::Rendered => {
                state.render = state.fetched_at.map(|start| elapsed.saturating_sub(start));
            }
            _ => {}
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn replay(collector: &MetricsCollector, id: &RequestId, phases: &[(DispatchPhase, u64)]) {
        for (phase, at) in phases {
            collector.on_phase(id, phase, ms(*at));
        }
    }

    // === Outcome Tests ===

    #[test]
    fn test_served_dispatch() {
        let collector = MetricsCollector::retaining();
        let id = RequestId::from_string("req-1");

        replay(
            &collector,
            &id,
            &[
                (DispatchPhase::Classified(ArtifactKind::Document), 0),
                (DispatchPhase::Resolved { found: true }, 1),
                (DispatchPhase::Gated { eligible: true }, 2),
                (DispatchPhase::Fetched, 7),
                (DispatchPhase::Rendered, 10),
                (DispatchPhase::Responded(200), 11),
            ],
        );

        let metrics = collector.take();
        assert_eq!(metrics.len(), 1);
        let m = &metrics[0];
        assert_eq!(m.request_id, "req-1");
        assert_eq!(m.artifact, Some(ArtifactKind::Document));
        assert_eq!(m.outcome, DispatchOutcome::Served);
        assert_eq!(m.status, Some(200));
        assert_eq!(m.fetch_us, Some(5_000));
        assert_eq!(m.render_us, Some(3_000));
        assert_eq!(m.total_us, 11_000);
        assert_eq!(collector.in_flight(), 0);
    }

    #[test]
    fn test_not_found_and_ineligible() {
        let collector = MetricsCollector::retaining();

        replay(
            &collector,
            &RequestId::from_string("missing"),
            &[
                (DispatchPhase::Classified(ArtifactKind::PageData), 0),
                (DispatchPhase::Resolved { found: false }, 1),
                (DispatchPhase::Responded(404), 1),
            ],
        );
        replay(
            &collector,
            &RequestId::from_string("static"),
            &[
                (DispatchPhase::Classified(ArtifactKind::Document), 0),
                (DispatchPhase::Resolved { found: true }, 1),
                (DispatchPhase::Gated { eligible: false }, 1),
                (DispatchPhase::Responded(404), 2),
            ],
        );

        let metrics = collector.take();
        assert_eq!(metrics[0].outcome, DispatchOutcome::NotFound);
        assert_eq!(metrics[1].outcome, DispatchOutcome::Ineligible);
        assert!(metrics.iter().all(|m| m.status == Some(404) && m.fetch_us.is_none()));
    }

    #[test]
    fn test_failed_dispatch() {
        let collector = MetricsCollector::retaining();
        let id = RequestId::from_string("req-2");

        replay(
            &collector,
            &id,
            &[
                (DispatchPhase::Classified(ArtifactKind::Document), 0),
                (DispatchPhase::Resolved { found: true }, 0),
                (DispatchPhase::Gated { eligible: true }, 0),
                (DispatchPhase::Failed("datastore unavailable".to_string()), 4),
            ],
        );

        let m = &collector.take()[0];
        assert_eq!(m.outcome, DispatchOutcome::Failed);
        assert_eq!(m.status, None);
        assert_eq!(m.error.as_deref(), Some("datastore unavailable"));
    }

    #[test]
    fn test_cancelled_dispatch_leaves_nothing_in_flight() {
        let collector = MetricsCollector::retaining();
        let id = RequestId::from_string("req-3");

        replay(
            &collector,
            &id,
            &[
                (DispatchPhase::Classified(ArtifactKind::PageData), 0),
                (DispatchPhase::Resolved { found: true }, 0),
                (DispatchPhase::Gated { eligible: true }, 1),
            ],
        );
        assert_eq!(collector.in_flight(), 1);

        collector.on_phase(&id, &DispatchPhase::Failed("cancelled".to_string()), ms(2));

        assert_eq!(collector.in_flight(), 0);
        let m = &collector.take()[0];
        assert_eq!(m.outcome, DispatchOutcome::Failed);
        assert_eq!(m.artifact, Some(ArtifactKind::PageData));
        assert_eq!(m.error.as_deref(), Some("cancelled"));
    }

    // === Collector Tests ===

    #[test]
    fn test_interleaved_requests() {
        let collector = MetricsCollector::retaining();
        let a = RequestId::from_string("a");
        let b = RequestId::from_string("b");

        collector.on_phase(&a, &DispatchPhase::Classified(ArtifactKind::Document), ms(0));
        collector.on_phase(&b, &DispatchPhase::Classified(ArtifactKind::PageData), ms(0));
        assert_eq!(collector.in_flight(), 2);

        collector.on_phase(&b, &DispatchPhase::Responded(200), ms(1));
        collector.on_phase(&a, &DispatchPhase::Responded(200), ms(2));

        let metrics = collector.take();
        assert_eq!(metrics[0].artifact, Some(ArtifactKind::PageData));
        assert_eq!(metrics[1].artifact, Some(ArtifactKind::Document));
        assert!(collector.take().is_empty());
    }

    #[test]
    fn test_non_retaining_collector_keeps_nothing() {
        let collector = MetricsCollector::new();
        let id = RequestId::from_string("req");
        collector.on_phase(&id, &DispatchPhase::Responded(404), ms(0));
        assert!(collector.take().is_empty());
        assert_eq!(collector.in_flight(), 0);
    }

    // === Formatting Tests ===

    #[test]
    fn test_metrics_json_and_summary() {
        let metrics = DispatchMetrics {
            request_id: "req-3".to_string(),
            artifact: Some(ArtifactKind::PageData),
            outcome: DispatchOutcome::NotFound,
            status: Some(404),
            fetch_us: None,
            render_us: None,
            total_us: 1500,
            error: None,
        };

        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["outcome"], "not_found");
        assert_eq!(json["artifact"], "page-data");
        assert!(json.get("fetch_us").is_none());

        let summary = metrics.to_summary();
        assert!(summary.contains("Outcome: not_found"));
        assert!(summary.contains("Total: 1500us (1.50ms)"));
    }
}

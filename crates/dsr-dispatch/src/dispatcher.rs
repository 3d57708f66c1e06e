//! Dispatch orchestration.

use std::sync::Arc;

use dsr_core::{
    ArtifactKind, DispatchError, DispatchPhase, LifecycleObserver, Request, RequestId, Response,
    TimingContext,
};
use dsr_engine::{Engine, FetchRequest};
use tracing::{debug, error, info, instrument, warn};

use crate::classify::RequestedArtifact;
use crate::gate::is_eligible;
use crate::response::{build_not_found, build_success};

/// Failure reason reported when a dispatch is dropped before responding.
pub const CANCELLED: &str = "cancelled";

/// Serves on-demand pages through an [`Engine`].
///
/// Holds no per-request state; one dispatcher serves concurrent requests.
#[derive(Clone)]
pub struct Dispatcher {
    engine: Arc<Engine>,
    observer: Option<Arc<dyn LifecycleObserver>>,
}

impl Dispatcher {
    /// Create a dispatcher over an engine.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            observer: None,
        }
    }

    /// Report lifecycle phases to an observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The engine this dispatcher calls into.
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Produce the response for a request.
    ///
    /// Missing and non-on-demand pages yield the 404 response. Fetch and
    /// render failures are returned as errors and never retried.
    #[instrument(
        name = "dispatch",
        skip(self, request),
        fields(request_id = %request.request_id, path = %request.path)
    )]
    pub async fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        let mut tracker = PhaseTracker::new(self.observer.as_deref(), &request.request_id);

        let artifact = RequestedArtifact::from_path(&request.path);
        tracker.enter(DispatchPhase::Classified(artifact.kind));
        debug!(
            artifact = %artifact.kind,
            canonical_path = %artifact.canonical_path,
            "request classified"
        );

        let page = self.engine.pages.find_page_by_path(&artifact.canonical_path);
        tracker.enter(DispatchPhase::Resolved {
            found: page.is_some(),
        });
        let Some(page) = page else {
            debug!("no page record");
            return Ok(tracker.respond(build_not_found()));
        };

        let eligible = is_eligible(&page);
        tracker.enter(DispatchPhase::Gated { eligible });
        if !eligible {
            debug!(mode = %page.mode, "page is not rendered on demand");
            return Ok(tracker.respond(build_not_found()));
        }

        let fetch = FetchRequest {
            path: &artifact.canonical_path,
            index: self.engine.pages.as_ref(),
        };
        let data = self.engine.fetcher.fetch_data(fetch).await.map_err(|source| {
            tracker.fail(DispatchError::Fetch {
                path: artifact.canonical_path.clone(),
                source,
            })
        })?;
        tracker.enter(DispatchPhase::Fetched);

        let body = match artifact.kind {
            ArtifactKind::PageData => {
                let payload = self
                    .engine
                    .renderer
                    .render_page_data(&data)
                    .await
                    .map_err(|source| {
                        tracker.fail(DispatchError::Render {
                            path: artifact.canonical_path.clone(),
                            source,
                        })
                    })?;
                serde_json::to_string(&payload).map_err(|source| {
                    tracker.fail(DispatchError::Serialize {
                        path: artifact.canonical_path.clone(),
                        source,
                    })
                })?
            }
            ArtifactKind::Document => {
                self.engine.renderer.render_html(&data).await.map_err(|source| {
                    tracker.fail(DispatchError::Render {
                        path: artifact.canonical_path.clone(),
                        source,
                    })
                })?
            }
        };
        tracker.enter(DispatchPhase::Rendered);

        let response = build_success(body, artifact.kind.content_type());
        info!(
            artifact = %artifact.kind,
            bytes = response.body.len(),
            fetch_us = tracker.micros_between("gated", "fetched"),
            render_us = tracker.micros_between("fetched", "rendered"),
            elapsed_us = tracker.timing.elapsed().as_micros() as u64,
            "served on demand"
        );
        Ok(tracker.respond(response))
    }
}

/// Reports the phases of one dispatch to the observer.
///
/// Dropped before reaching `Responded` or `Failed` (the dispatch future was
/// cancelled), it reports `Failed("cancelled")` so observers never keep a
/// dispatch open.
struct PhaseTracker<'a> {
    observer: Option<&'a dyn LifecycleObserver>,
    request_id: &'a RequestId,
    timing: TimingContext,
    finished: bool,
}

impl<'a> PhaseTracker<'a> {
    fn new(observer: Option<&'a dyn LifecycleObserver>, request_id: &'a RequestId) -> Self {
        Self {
            observer,
            request_id,
            timing: TimingContext::new(),
            finished: false,
        }
    }

    fn enter(&mut self, phase: DispatchPhase) {
        self.timing.mark(phase.name());
        if matches!(phase, DispatchPhase::Responded(_) | DispatchPhase::Failed(_)) {
            self.finished = true;
        }
        if let Some(observer) = self.observer {
            observer.on_phase(self.request_id, &phase, self.timing.elapsed());
        }
    }

    fn respond(&mut self, response: Response) -> Response {
        self.enter(DispatchPhase::Responded(response.status));
        response
    }

    fn fail(&mut self, err: DispatchError) -> DispatchError {
        error!(error = %err, "collaborator failed");
        self.enter(DispatchPhase::Failed(err.to_string()));
        err
    }

    fn micros_between(&self, from: &str, to: &str) -> Option<u64> {
        self.timing.between(from, to).map(|d| d.as_micros() as u64)
    }
}

impl Drop for PhaseTracker<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(request_id = %self.request_id, "dispatch cancelled before responding");
            self.enter(DispatchPhase::Failed(CANCELLED.to_string()));
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("engine", &self.engine)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

//! End-to-end dispatch behaviour against in-memory collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dsr_cache::generate_etag;
use dsr_core::{
    DispatchError, DispatchPhase, EngineError, LifecycleObserver, PageRecord, RenderData,
    RenderMode, Request, RequestId, Response,
};
use dsr_dispatch::{build_not_found, Dispatcher, Runtime, CANCELLED, NOT_FOUND_BODY};
use dsr_engine::{DataFetcher, Engine, EngineLoader, FetchRequest, PageIndex, PageRenderer};
use dsr_observability::{DispatchOutcome, MetricsCollector};
use serde_json::json;

// === Fakes ===

struct MemoryIndex(HashMap<String, PageRecord>);

impl MemoryIndex {
    fn new(pages: Vec<PageRecord>) -> Self {
        Self(pages.into_iter().map(|p| (p.path.clone(), p)).collect())
    }
}

impl PageIndex for MemoryIndex {
    fn find_page_by_path(&self, path: &str) -> Option<PageRecord> {
        self.0.get(path).cloned()
    }
}

#[derive(Default)]
struct CountingFetcher {
    calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl DataFetcher for CountingFetcher {
    async fn fetch_data(&self, request: FetchRequest<'_>) -> Result<RenderData, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(EngineError::Other("datastore unavailable".to_string()));
        }
        let page = request
            .index
            .find_page_by_path(request.path)
            .ok_or_else(|| EngineError::MissingData(request.path.to_string()))?;
        Ok(json!({ "path": page.path, "title": "About us" }))
    }
}

#[derive(Default)]
struct EchoRenderer {
    fail: bool,
}

#[async_trait]
impl PageRenderer for EchoRenderer {
    async fn render_html(&self, data: &RenderData) -> Result<String, EngineError> {
        if self.fail {
            return Err(EngineError::Other("template error".to_string()));
        }
        Ok(format!(
            "<html><body><h1>{}</h1></body></html>",
            data["title"].as_str().unwrap_or_default()
        ))
    }

    async fn render_page_data(&self, data: &RenderData) -> Result<serde_json::Value, EngineError> {
        Ok(json!({ "path": data["path"], "result": { "data": data } }))
    }
}

#[derive(Default)]
struct RecordingObserver {
    phases: Mutex<Vec<DispatchPhase>>,
}

impl RecordingObserver {
    fn names(&self) -> Vec<&'static str> {
        self.phases.lock().unwrap().iter().map(|p| p.name()).collect()
    }
}

impl LifecycleObserver for RecordingObserver {
    fn on_phase(&self, _request_id: &RequestId, phase: &DispatchPhase, _elapsed: Duration) {
        self.phases.lock().unwrap().push(phase.clone());
    }
}

fn pages() -> Vec<PageRecord> {
    vec![
        PageRecord::new("/about", RenderMode::OnDemand),
        PageRecord::new("/", RenderMode::OnDemand),
        PageRecord::new("/blog", RenderMode::Static),
    ]
}

fn make_engine(fetcher: Arc<CountingFetcher>, renderer: EchoRenderer) -> Arc<Engine> {
    Arc::new(Engine::new(
        Arc::new(MemoryIndex::new(pages())),
        fetcher,
        Arc::new(renderer),
    ))
}

fn make_dispatcher() -> (Dispatcher, Arc<CountingFetcher>) {
    let fetcher = Arc::new(CountingFetcher::default());
    let dispatcher = Dispatcher::new(make_engine(fetcher.clone(), EchoRenderer::default()));
    (dispatcher, fetcher)
}

async fn dispatch(dispatcher: &Dispatcher, path: &str) -> Response {
    dispatcher.dispatch(&Request::new(path)).await.unwrap()
}

// === Scenario Tests ===

#[tokio::test]
async fn test_document_for_on_demand_page() {
    let (dispatcher, _) = make_dispatcher();

    let resp = dispatch(&dispatcher, "/about").await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, "<html><body><h1>About us</h1></body></html>");
    assert_eq!(resp.content_type(), Some("text/html; charset=utf-8"));
    assert_eq!(resp.etag(), Some(generate_etag(&resp.body).as_str()));
}

#[tokio::test]
async fn test_page_data_for_on_demand_page() {
    let (dispatcher, _) = make_dispatcher();

    let resp = dispatch(&dispatcher, "/page-data/about/page-data.json").await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type(), Some("application/json"));
    assert_eq!(resp.etag(), Some(generate_etag(&resp.body).as_str()));

    let payload: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(payload["path"], "/about");
    // Compact serialization, as the ETag is computed over these exact bytes.
    assert!(!resp.body.contains('\n'));
}

#[tokio::test]
async fn test_page_data_for_root_page() {
    let (dispatcher, _) = make_dispatcher();

    let resp = dispatch(&dispatcher, "/page-data/index/page-data.json").await;

    assert_eq!(resp.status, 200);
    let payload: serde_json::Value = serde_json::from_str(&resp.body).unwrap();
    assert_eq!(payload["path"], "/");
}

#[tokio::test]
async fn test_unknown_page_is_not_found() {
    let (dispatcher, fetcher) = make_dispatcher();

    let resp = dispatch(&dispatcher, "/unknown-page").await;

    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, NOT_FOUND_BODY);
    assert_eq!(resp.content_type(), Some("text/plain; charset=utf-8"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_static_page_is_not_found() {
    let (dispatcher, fetcher) = make_dispatcher();

    let resp = dispatch(&dispatcher, "/blog").await;

    assert_eq!(resp, build_not_found());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

/// Missing and ineligible pages are deliberately indistinguishable.
#[tokio::test]
async fn test_missing_and_ineligible_responses_are_identical() {
    let (dispatcher, _) = make_dispatcher();

    let missing = dispatch(&dispatcher, "/unknown-page").await;
    let ineligible = dispatch(&dispatcher, "/blog").await;
    let missing_data = dispatch(&dispatcher, "/page-data/unknown-page/page-data.json").await;
    let ineligible_data = dispatch(&dispatcher, "/page-data/blog/page-data.json").await;

    assert_eq!(missing, ineligible);
    assert_eq!(missing, missing_data);
    assert_eq!(missing, ineligible_data);
}

#[tokio::test]
async fn test_overlapping_page_data_path_is_not_found() {
    let (dispatcher, _) = make_dispatcher();

    let resp = dispatch(&dispatcher, "/page-data/page-data.json").await;

    assert_eq!(resp, build_not_found());
}

// === Determinism Tests ===

#[tokio::test]
async fn test_identical_renders_share_etag() {
    let (dispatcher, _) = make_dispatcher();

    for path in ["/about", "/page-data/about/page-data.json"] {
        let first = dispatch(&dispatcher, path).await;
        let second = dispatch(&dispatcher, path).await;
        assert_eq!(first.body, second.body);
        assert_eq!(first.etag(), second.etag());
    }
}

#[tokio::test]
async fn test_content_type_follows_classification() {
    let (dispatcher, _) = make_dispatcher();

    let document = dispatch(&dispatcher, "/about").await;
    let page_data = dispatch(&dispatcher, "/page-data/about/page-data.json").await;

    assert_eq!(document.content_type(), Some("text/html; charset=utf-8"));
    assert_eq!(page_data.content_type(), Some("application/json"));
    assert_ne!(document.etag(), page_data.etag());
}

// === Failure Tests ===

#[tokio::test]
async fn test_fetch_failure_propagates_without_retry() {
    let fetcher = Arc::new(CountingFetcher {
        fail: true,
        ..Default::default()
    });
    let observer = Arc::new(RecordingObserver::default());
    let dispatcher = Dispatcher::new(make_engine(fetcher.clone(), EchoRenderer::default()))
        .with_observer(observer.clone());

    let err = dispatcher.dispatch(&Request::new("/about")).await.unwrap_err();

    assert!(matches!(err, DispatchError::Fetch { ref path, .. } if path == "/about"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(observer.names().last(), Some(&"failed"));
}

#[tokio::test]
async fn test_render_failure_propagates() {
    let fetcher = Arc::new(CountingFetcher::default());
    let dispatcher = Dispatcher::new(make_engine(fetcher, EchoRenderer { fail: true }));

    let err = dispatcher.dispatch(&Request::new("/about")).await.unwrap_err();

    assert!(matches!(err, DispatchError::Render { .. }));
}

// === Lifecycle Tests ===

#[tokio::test]
async fn test_lifecycle_for_served_page() {
    let observer = Arc::new(RecordingObserver::default());
    let (dispatcher, _) = make_dispatcher();
    let dispatcher = dispatcher.with_observer(observer.clone());

    dispatch(&dispatcher, "/page-data/about/page-data.json").await;

    assert_eq!(
        observer.names(),
        vec!["classified", "resolved", "gated", "fetched", "rendered", "responded"]
    );
    let phases = observer.phases.lock().unwrap();
    assert_eq!(
        phases[0],
        DispatchPhase::Classified(dsr_core::ArtifactKind::PageData)
    );
    assert_eq!(phases[5], DispatchPhase::Responded(200));
}

#[tokio::test]
async fn test_lifecycle_short_circuits() {
    let observer = Arc::new(RecordingObserver::default());
    let (dispatcher, _) = make_dispatcher();
    let dispatcher = dispatcher.with_observer(observer.clone());

    dispatch(&dispatcher, "/unknown-page").await;
    assert_eq!(observer.names(), vec!["classified", "resolved", "responded"]);

    observer.phases.lock().unwrap().clear();
    dispatch(&dispatcher, "/blog").await;
    assert_eq!(
        observer.names(),
        vec!["classified", "resolved", "gated", "responded"]
    );
    assert_eq!(
        observer.phases.lock().unwrap()[2],
        DispatchPhase::Gated { eligible: false }
    );
}

// === Cancellation Tests ===

struct StalledFetcher;

#[async_trait]
impl DataFetcher for StalledFetcher {
    async fn fetch_data(&self, _request: FetchRequest<'_>) -> Result<RenderData, EngineError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(json!({}))
    }
}

#[tokio::test]
async fn test_cancelled_dispatch_completes_metrics() {
    let metrics = Arc::new(MetricsCollector::retaining());
    let engine = Arc::new(Engine::new(
        Arc::new(MemoryIndex::new(pages())),
        Arc::new(StalledFetcher),
        Arc::new(EchoRenderer::default()),
    ));
    let dispatcher = Dispatcher::new(engine).with_observer(metrics.clone());

    for _ in 0..5 {
        let request = Request::new("/about");
        let result =
            tokio::time::timeout(Duration::from_millis(1), dispatcher.dispatch(&request)).await;
        assert!(result.is_err());
    }

    assert_eq!(metrics.in_flight(), 0);
    let completed = metrics.take();
    assert_eq!(completed.len(), 5);
    for m in &completed {
        assert_eq!(m.outcome, DispatchOutcome::Failed);
        assert_eq!(m.error.as_deref(), Some(CANCELLED));
        assert_eq!(m.status, None);
    }
}

#[tokio::test]
async fn test_cancelled_dispatch_reports_failed_phase() {
    let observer = Arc::new(RecordingObserver::default());
    let engine = Arc::new(Engine::new(
        Arc::new(MemoryIndex::new(pages())),
        Arc::new(StalledFetcher),
        Arc::new(EchoRenderer::default()),
    ));
    let dispatcher = Dispatcher::new(engine).with_observer(observer.clone());

    let request = Request::new("/about");
    let _ = tokio::time::timeout(Duration::from_millis(1), dispatcher.dispatch(&request)).await;

    assert_eq!(
        observer.names(),
        vec!["classified", "resolved", "gated", "failed"]
    );
    assert_eq!(
        observer.phases.lock().unwrap()[3],
        DispatchPhase::Failed(CANCELLED.to_string())
    );
}

#[tokio::test]
async fn test_completed_dispatch_reports_single_terminal_phase() {
    let observer = Arc::new(RecordingObserver::default());
    let (dispatcher, _) = make_dispatcher();
    let dispatcher = dispatcher.with_observer(observer.clone());

    dispatch(&dispatcher, "/about").await;
    dispatch(&dispatcher, "/missing").await;

    let names = observer.names();
    assert_eq!(names.iter().filter(|n| **n == "responded").count(), 2);
    assert!(!names.contains(&"failed"));
}

// === Runtime Tests ===

struct CountingLoader {
    loads: AtomicUsize,
    failures_before_success: usize,
}

impl CountingLoader {
    fn new(failures_before_success: usize) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            failures_before_success,
        }
    }
}

#[async_trait]
impl EngineLoader for CountingLoader {
    async fn load(&self) -> Result<Engine, EngineError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        if attempt < self.failures_before_success {
            return Err(EngineError::MissingSubsystem("page-ssr".to_string()));
        }
        Ok(Engine::new(
            Arc::new(MemoryIndex::new(pages())),
            Arc::new(CountingFetcher::default()),
            Arc::new(EchoRenderer::default()),
        ))
    }
}

#[tokio::test]
async fn test_concurrent_first_requests_initialize_once() {
    let loader = Arc::new(CountingLoader::new(0));
    let runtime = Runtime::new(loader.clone());

    let responses = futures::future::join_all((0..16).map(|_| runtime.handle("/about"))).await;

    assert!(responses.iter().all(|r| r.as_ref().unwrap().status == 200));
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);

    runtime.handle("/page-data/about/page-data.json").await.unwrap();
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_initialization_across_threads() {
    let loader = Arc::new(CountingLoader::new(0));
    let runtime = Arc::new(Runtime::new(loader.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let runtime = runtime.clone();
            tokio::spawn(async move { runtime.handle("/about").await.map(|r| r.status) })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 200);
    }
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    assert!(runtime.is_initialized());
}

#[tokio::test]
async fn test_failed_initialization_is_retried() {
    let loader = Arc::new(CountingLoader::new(1));
    let runtime = Runtime::new(loader.clone());

    let err = runtime.handle("/about").await.unwrap_err();
    assert!(matches!(err, DispatchError::Init(_)));
    assert!(!runtime.is_initialized());

    let resp = runtime.handle("/about").await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
}

//! Process-wide initialization in front of the dispatcher.

use std::sync::Arc;

use dsr_core::{DispatchError, LifecycleObserver, Request, Response};
use dsr_engine::EngineLoader;
use tokio::sync::OnceCell;
use tracing::info;

use crate::dispatcher::Dispatcher;

/// Entry point for the hosting runtime.
///
/// The engine is loaded on first use. Concurrent first requests wait on the
/// same load; later requests reuse it. A failed load is not cached, so the
/// next request tries again.
pub struct Runtime {
    loader: Arc<dyn EngineLoader>,
    observer: Option<Arc<dyn LifecycleObserver>>,
    dispatcher: OnceCell<Dispatcher>,
}

impl Runtime {
    /// Create a runtime that loads its engine with `loader`.
    pub fn new(loader: Arc<dyn EngineLoader>) -> Self {
        Self {
            loader,
            observer: None,
            dispatcher: OnceCell::new(),
        }
    }

    /// Report lifecycle phases of every request to an observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Whether the engine has been loaded.
    pub fn is_initialized(&self) -> bool {
        self.dispatcher.initialized()
    }

    /// Load the engine if it has not been loaded yet.
    pub async fn ensure_initialized(&self) -> Result<&Dispatcher, DispatchError> {
        self.dispatcher
            .get_or_try_init(|| async {
                let engine = self.loader.load().await.map_err(DispatchError::Init)?;
                info!("runtime initialized");

                let dispatcher = Dispatcher::new(Arc::new(engine));
                let dispatcher = match &self.observer {
                    Some(observer) => dispatcher.with_observer(observer.clone()),
                    None => dispatcher,
                };
                Ok::<_, DispatchError>(dispatcher)
            })
            .await
    }

    /// Handle a request path.
    pub async fn handle(&self, path: &str) -> Result<Response, DispatchError> {
        self.handle_request(Request::new(path)).await
    }

    /// Handle a prepared request.
    pub async fn handle_request(&self, request: Request) -> Result<Response, DispatchError> {
        let dispatcher = self.ensure_initialized().await?;
        dispatcher.dispatch(&request).await
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

//! Task spawning abstraction
//!
//! The view model and the tile loader never call `tokio::spawn` directly.
//! They are handed an [`AsyncSpawner`], so the egui app can own its runtime
//! on a separate set of worker threads while tests use the ambient test
//! runtime.

use crate::prelude::BoxFuture;
use crate::{MapError, Result};
use futures::FutureExt;
use std::future::Future;
use std::sync::Arc;

/// Object-safe task spawner
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned task
pub trait AsyncHandle: Send + Sync {
    fn is_finished(&self) -> bool;

    /// Abort the task at its next await point
    fn cancel(&self);
}

/// Spawn with type inference instead of boxing at every call site
pub fn spawn<F>(spawner: &dyn AsyncSpawner, future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    spawner.spawn_boxed(future.boxed())
}

/// Spawns onto a specific tokio runtime
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    pub fn from_handle(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// The runtime the caller is currently running on
    pub fn current() -> Result<Self> {
        tokio::runtime::Handle::try_current()
            .map(Self::from_handle)
            .map_err(|e| MapError::Runtime(format!("no tokio runtime available: {e}")))
    }

    pub fn shared(self) -> Arc<dyn AsyncSpawner> {
        Arc::new(self)
    }
}

impl AsyncSpawner for TokioSpawner {
    fn spawn_boxed(&self, future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle> {
        Box::new(TokioHandle(self.handle.spawn(future)))
    }
}

struct TokioHandle(tokio::task::JoinHandle<()>);

impl AsyncHandle for TokioHandle {
    fn is_finished(&self) -> bool {
        self.0.is_finished()
    }

    fn cancel(&self) {
        self.0.abort();
    }
}

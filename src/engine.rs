use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::{Result, StickerSegError};

type Loader<S> = Box<dyn Fn() -> Result<Arc<S>> + Send + Sync>;

/// Lazily-initialized handle to a segmentation engine.
///
/// The engine is loaded on first use while holding the lock, so concurrent
/// callers never load it twice. A cached engine is reused until
/// [`StrategyHandle::invalidate`] drops it; the next `acquire` reloads.
pub struct StrategyHandle<S: ?Sized> {
    name: String,
    loader: Loader<S>,
    slot: Mutex<Option<Arc<S>>>,
}

impl<S: ?Sized + Send + Sync + 'static> StrategyHandle<S> {
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<S>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            loader: Box::new(loader),
            slot: Mutex::new(None),
        }
    }

    /// Wraps an engine that is already constructed. Invalidating it only
    /// clears the cache; the same instance is handed out again afterwards.
    pub fn ready(name: impl Into<String>, engine: Arc<S>) -> Self {
        let cached = Arc::clone(&engine);
        let handle = Self::new(name, move || Ok(Arc::clone(&engine)));
        *handle.slot.lock() = Some(cached);
        handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn acquire(&self) -> Result<Arc<S>> {
        let mut slot = self.slot.lock();
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        tracing::debug!(engine = %self.name, "loading segmentation engine");
        let engine = (self.loader)().map_err(|err| StickerSegError::unavailable(&self.name, err))?;
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Drops the cached engine if it is still `failed`. A caller holding an
    /// engine that was already replaced leaves the newer one in place.
    pub fn invalidate(&self, failed: &Arc<S>) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, failed)) {
            *slot = None;
            tracing::debug!(engine = %self.name, "segmentation engine handle invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.lock().is_some()
    }
}

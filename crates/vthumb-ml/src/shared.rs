//! Lazily loaded, process-wide model handle.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use crate::clip::ClipModel;
use crate::config::ClipConfig;
use crate::error::{MlError, MlResult};

type Loader<T> = Box<dyn Fn() -> MlResult<T> + Send + Sync>;

/// Loads a model on first use and hands out the same `Arc` afterwards.
///
/// Concurrent first callers wait on a single load. A failed load is not
/// remembered, so the next caller tries again.
pub struct LazyModel<T> {
    cell: OnceCell<Arc<T>>,
    loader: Loader<T>,
}

impl<T: Send + Sync + 'static> LazyModel<T> {
    pub fn new(loader: impl Fn() -> MlResult<T> + Send + Sync + 'static) -> Self {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    /// The loaded model, loading it in place if needed.
    ///
    /// Loading blocks the current worker thread, so this needs the
    /// multi-threaded runtime.
    pub async fn get(&self) -> MlResult<Arc<T>> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                let model = tokio::task::block_in_place(|| (self.loader)())?;
                Ok::<_, MlError>(Arc::new(model))
            })
            .await?;
        Ok(Arc::clone(model))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

/// Lazy handle for the CLIP model described by `config`.
pub fn lazy_clip(config: ClipConfig) -> LazyModel<ClipModel> {
    LazyModel::new(move || {
        info!(model_path = %config.model_path.display(), "Loading CLIP model");
        ClipModel::load(&config)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_loads_once_and_shares() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let lazy = Arc::new(LazyModel::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42u32)
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = lazy.clone();
                tokio::spawn(async move { lazy.get().await.unwrap() })
            })
            .collect();
        let mut models = Vec::new();
        for handle in handles {
            models.push(handle.await.unwrap());
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(models.iter().all(|m| Arc::ptr_eq(m, &models[0])));
        assert!(lazy.is_loaded());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_load_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let lazy = LazyModel::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(MlError::Internal("disk hiccup".to_string()))
            } else {
                Ok("model")
            }
        });

        assert!(lazy.get().await.is_err());
        assert!(!lazy.is_loaded());
        assert_eq!(*lazy.get().await.unwrap(), "model");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lazy_clip_surfaces_missing_model() {
        let lazy = lazy_clip(ClipConfig {
            model_path: "/nonexistent/clip.onnx".into(),
            ..ClipConfig::default()
        });
        assert!(matches!(lazy.get().await, Err(MlError::ModelNotFound(_))));
    }
}

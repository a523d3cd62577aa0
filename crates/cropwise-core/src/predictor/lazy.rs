use crate::conditions::FieldConditions;
use crate::error::CropwiseError;
use crate::predictor::{CropPrediction, CropPredictor};
use std::sync::{Arc, OnceLock};

type Loader = Box<dyn Fn() -> Result<Arc<dyn CropPredictor>, CropwiseError> + Send + Sync>;

/// Defers construction of an expensive predictor until first use.
///
/// The loader runs at most once per instance, even under concurrent first
/// calls. A failed load is remembered and the predictor then reports itself
/// unavailable for the rest of its lifetime.
pub struct LazyPredictor {
    name: String,
    loader: Loader,
    cell: OnceLock<Option<Arc<dyn CropPredictor>>>,
}

impl LazyPredictor {
    pub fn new<F>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn CropPredictor>, CropwiseError> + Send + Sync + 'static,
    {
        LazyPredictor {
            name: name.into(),
            loader: Box::new(loader),
            cell: OnceLock::new(),
        }
    }

    fn inner(&self) -> Option<&Arc<dyn CropPredictor>> {
        self.cell
            .get_or_init(|| match (self.loader)() {
                Ok(predictor) => {
                    tracing::debug!(
                        backend = %self.name,
                        inner = predictor.backend_name(),
                        "predictor loaded"
                    );
                    Some(predictor)
                }
                Err(e) => {
                    tracing::warn!(backend = %self.name, error = %e, "predictor failed to load; disabled");
                    None
                }
            })
            .as_ref()
    }

    fn require(&self) -> Result<&Arc<dyn CropPredictor>, CropwiseError> {
        self.inner()
            .ok_or_else(|| CropwiseError::PredictorUnavailable(format!("{} failed to load", self.name)))
    }
}

impl std::fmt::Debug for LazyPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyPredictor")
            .field("name", &self.name)
            .field("initialized", &self.cell.get().is_some())
            .finish()
    }
}

impl CropPredictor for LazyPredictor {
    fn is_available(&self) -> bool {
        self.inner().is_some_and(|p| p.is_available())
    }

    fn predict(
        &self,
        conditions: &FieldConditions,
        limit: usize,
    ) -> Result<Vec<CropPrediction>, CropwiseError> {
        self.require()?.predict(conditions, limit)
    }

    fn predict_yield(
        &self,
        crop_name: &str,
        conditions: &FieldConditions,
    ) -> Result<Option<f64>, CropwiseError> {
        self.require()?.predict_yield(crop_name, conditions)
    }

    fn backend_name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::NullPredictor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_loader_runs_once_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = LazyPredictor::new("null", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullPredictor) as Arc<dyn CropPredictor>)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!lazy.is_available());
        assert!(!lazy.is_available());
        assert_eq!(lazy.predict_yield("Rice", &FieldConditions::default()).unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = LazyPredictor::new("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CropwiseError::ModelInvalid("corrupt".into()))
        });
        for _ in 0..3 {
            assert!(!lazy.is_available());
        }
        let err = lazy.predict(&FieldConditions::default(), 5).unwrap_err();
        assert!(matches!(err, CropwiseError::PredictorUnavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = Arc::new(LazyPredictor::new("null", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullPredictor) as Arc<dyn CropPredictor>)
        }));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                std::thread::spawn(move || lazy.is_available())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

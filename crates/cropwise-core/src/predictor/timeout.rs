use crate::conditions::FieldConditions;
use crate::error::CropwiseError;
use crate::predictor::{CropPrediction, CropPredictor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Bounds predictor work by a deadline.
///
/// Work runs on a worker thread. When the deadline passes the caller gets
/// `PredictorTimeout` and the worker is abandoned. While any abandoned worker
/// is still running, new calls are refused without spawning, so a hung
/// backend holds at most the workers that were in flight when it hung.
#[derive(Clone)]
pub struct TimeoutPredictor {
    inner: Arc<dyn CropPredictor>,
    timeout: Duration,
    stalled: Arc<AtomicUsize>,
}

/// Shared between a caller and its worker; both sides update it under the lock.
#[derive(Default)]
struct CallState {
    finished: bool,
    abandoned: bool,
}

impl TimeoutPredictor {
    pub fn new(inner: Arc<dyn CropPredictor>, timeout: Duration) -> Self {
        TimeoutPredictor {
            inner,
            timeout,
            stalled: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Abandoned workers that have not returned yet.
    pub fn stalled_workers(&self) -> usize {
        self.stalled.load(Ordering::SeqCst)
    }

    fn timeout_error(&self) -> CropwiseError {
        CropwiseError::PredictorTimeout {
            backend: self.inner.backend_name().to_string(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }

    /// Run `call` against the wrapped predictor within one deadline.
    ///
    /// Everything `call` does, however many predictor methods it touches,
    /// shares the same deadline.
    pub fn run_bounded<T, F>(&self, call: F) -> Result<T, CropwiseError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CropPredictor) -> Result<T, CropwiseError> + Send + 'static,
    {
        if self.stalled_workers() > 0 {
            return Err(CropwiseError::PredictorUnavailable(format!(
                "{} has a call still running past its deadline",
                self.inner.backend_name()
            )));
        }

        let (tx, rx) = mpsc::channel();
        let state = Arc::new(Mutex::new(CallState::default()));
        let worker_state = Arc::clone(&state);
        let stalled = Arc::clone(&self.stalled);
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("cropwise-predictor".into())
            .spawn(move || {
                let result = call(inner.as_ref());
                if let Ok(mut s) = worker_state.lock() {
                    s.finished = true;
                    if s.abandoned {
                        stalled.fetch_sub(1, Ordering::SeqCst);
                    }
                }
                // The receiver is gone after a timeout.
                let _ = tx.send(result);
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if let Ok(mut s) = state.lock() {
                    if !s.finished {
                        s.abandoned = true;
                        self.stalled.fetch_add(1, Ordering::SeqCst);
                    }
                }
                Err(self.timeout_error())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(CropwiseError::Predictor {
                backend: self.inner.backend_name().to_string(),
                reason: "worker exited without a result".into(),
            }),
        }
    }
}

impl std::fmt::Debug for TimeoutPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutPredictor")
            .field("inner", &self.inner.backend_name())
            .field("timeout", &self.timeout)
            .field("stalled", &self.stalled_workers())
            .finish()
    }
}

impl CropPredictor for TimeoutPredictor {
    /// Availability checks may load the backend, so they share the deadline.
    fn is_available(&self) -> bool {
        self.run_bounded(|p| Ok(p.is_available())).unwrap_or(false)
    }

    fn predict(
        &self,
        conditions: &FieldConditions,
        limit: usize,
    ) -> Result<Vec<CropPrediction>, CropwiseError> {
        let conditions = conditions.clone();
        self.run_bounded(move |p| p.predict(&conditions, limit))
    }

    fn predict_yield(
        &self,
        crop_name: &str,
        conditions: &FieldConditions,
    ) -> Result<Option<f64>, CropwiseError> {
        let conditions = conditions.clone();
        let crop_name = crop_name.to_string();
        self.run_bounded(move |p| p.predict_yield(&crop_name, &conditions))
    }

    fn backend_name(&self) -> &str {
        self.inner.backend_name()
    }
}

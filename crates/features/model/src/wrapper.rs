//! Model lifecycle: blocking or background warm-up and the status readiness reports on.

use crate::classifier::Classifier;
use crate::error::ModelError;
use crate::source::ModelSource;
use dwaste_domain::registry::FeatureSlice;
use dwaste_kernel::server::{Readiness, ReadinessProbe};
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Observable warm-up progress. Only moves forward: `Pending → Warming → Ready | Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmupStatus {
    Pending,
    Warming,
    Ready,
    Failed(String),
}

#[derive(Debug)]
enum Phase {
    Pending,
    Warming,
    Ready(Arc<Classifier>),
    Failed(String),
}

#[derive(Debug)]
struct ModelWrapperInner {
    source: Arc<dyn ModelSource>,
    warmup_delay: Duration,
    phase: RwLock<Phase>,
}

/// The trained model shared by every inference handler.
#[derive(Debug, Clone)]
pub struct ModelWrapper {
    inner: Arc<ModelWrapperInner>,
}

impl ModelWrapper {
    pub fn new(source: Arc<dyn ModelSource>) -> Self {
        Self::with_warmup_delay(source, Duration::ZERO)
    }

    /// `warmup_delay` is slept before loading, to rehearse slow warm-ups.
    pub fn with_warmup_delay(source: Arc<dyn ModelSource>, warmup_delay: Duration) -> Self {
        Self {
            inner: Arc::new(ModelWrapperInner {
                source,
                warmup_delay,
                phase: RwLock::new(Phase::Pending),
            }),
        }
    }

    /// Loads the model and runs one inference, blocking until done.
    ///
    /// Calling it on an already warmed-up model is a no-op.
    ///
    /// # Errors
    /// Returns the load or inference error; the status becomes [`WarmupStatus::Failed`].
    pub fn init(&self) -> Result<(), ModelError> {
        if self.begin()? {
            self.warm_up()
        } else {
            Ok(())
        }
    }

    /// Starts warm-up on a dedicated thread and returns immediately.
    ///
    /// Failures are reported only through [`ModelWrapper::status`] and the returned handle.
    ///
    /// # Errors
    /// Returns an error if warm-up already ran or the thread cannot be spawned.
    pub fn multithreaded_init(&self) -> Result<WarmupHandle, ModelError> {
        if !self.begin()? {
            return Err(ModelError::warmup("model is already warmed up"));
        }

        let model = self.clone();
        let thread = std::thread::Builder::new()
            .name("model-warmup".to_owned())
            .spawn(move || model.warm_up())
            .map_err(|e| {
                *self.inner.phase.write() = Phase::Failed(e.to_string());
                ModelError::warmup(format!("cannot spawn warm-up thread: {e}"))
            })?;

        Ok(WarmupHandle { model: self.clone(), thread: Some(thread) })
    }

    #[must_use]
    pub fn status(&self) -> WarmupStatus {
        match &*self.inner.phase.read() {
            Phase::Pending => WarmupStatus::Pending,
            Phase::Warming => WarmupStatus::Warming,
            Phase::Ready(_) => WarmupStatus::Ready,
            Phase::Failed(reason) => WarmupStatus::Failed(reason.clone()),
        }
    }

    /// The warmed-up classifier.
    ///
    /// # Errors
    /// Returns [`ModelError::NotReady`] until warm-up has succeeded.
    pub fn classifier(&self) -> Result<Arc<Classifier>, ModelError> {
        match &*self.inner.phase.read() {
            Phase::Ready(classifier) => Ok(Arc::clone(classifier)),
            Phase::Pending => Err(ModelError::not_ready("warm-up has not started")),
            Phase::Warming => Err(ModelError::not_ready("warm-up in progress")),
            Phase::Failed(reason) => Err(ModelError::not_ready(format!("warm-up failed: {reason}"))),
        }
    }

    /// Moves `Pending` to `Warming`. Returns `false` if the model is already ready.
    fn begin(&self) -> Result<bool, ModelError> {
        let mut phase = self.inner.phase.write();
        match &*phase {
            Phase::Pending => {
                *phase = Phase::Warming;
                Ok(true)
            },
            Phase::Ready(_) => Ok(false),
            Phase::Warming => Err(ModelError::warmup("warm-up already in progress")),
            Phase::Failed(reason) => Err(ModelError::warmup(format!("warm-up already failed: {reason}"))),
        }
    }

    fn warm_up(&self) -> Result<(), ModelError> {
        let started = Instant::now();
        if !self.inner.warmup_delay.is_zero() {
            std::thread::sleep(self.inner.warmup_delay);
        }

        let result = self.inner.source.load().and_then(|classifier| {
            classifier.predict(&vec![0.0; classifier.feature_len()])?;
            Ok(classifier)
        });

        match result {
            Ok(classifier) => {
                info!(
                    version = %classifier.version(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Model warmed up"
                );
                *self.inner.phase.write() = Phase::Ready(Arc::new(classifier));
                Ok(())
            },
            Err(e) => {
                error!(error = %e, "Model warm-up failed");
                *self.inner.phase.write() = Phase::Failed(e.to_string());
                Err(e)
            },
        }
    }
}

impl ReadinessProbe for ModelWrapper {
    fn readiness(&self) -> Readiness {
        match self.classifier() {
            Ok(_) => Readiness::Ready,
            Err(e) => Readiness::NotReady { detail: e.to_string().into() },
        }
    }
}

impl FeatureSlice for ModelWrapper {
    fn name(&self) -> &'static str {
        "model"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Handle on a background warm-up.
#[derive(Debug)]
pub struct WarmupHandle {
    model: ModelWrapper,
    thread: Option<JoinHandle<Result<(), ModelError>>>,
}

impl WarmupHandle {
    #[must_use]
    pub fn status(&self) -> WarmupStatus {
        self.model.status()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Blocks until warm-up completes.
    ///
    /// # Errors
    /// Returns the warm-up error, or [`ModelError::Internal`] if the warm-up thread panicked.
    pub fn join(mut self) -> Result<(), ModelError> {
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| ModelError::internal("warm-up thread panicked"))?,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassifierArtifact;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct StubSource {
        loads: AtomicUsize,
        fail: bool,
    }

    impl ModelSource for StubSource {
        fn load(&self) -> Result<Classifier, ModelError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ModelError::artifact("broken"));
            }
            Classifier::from_artifact(ClassifierArtifact {
                version: "stub".to_owned(),
                labels: vec!["a".to_owned()],
                input_size: 2,
                bins: 1,
                weights: vec![vec![0.0; 3]],
                bias: vec![0.0],
            })
        }
    }

    #[test]
    fn init_reaches_ready_and_is_idempotent() {
        let source = Arc::new(StubSource::default());
        let model = ModelWrapper::new(source.clone());
        assert_eq!(model.status(), WarmupStatus::Pending);

        model.init().expect("init");
        model.init().expect("second init");

        assert_eq!(model.status(), WarmupStatus::Ready);
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert!(model.readiness().is_ready());
    }

    #[test]
    fn failed_init_is_terminal() {
        let model = ModelWrapper::new(Arc::new(StubSource { fail: true, ..StubSource::default() }));
        assert!(model.init().is_err());
        assert!(matches!(model.status(), WarmupStatus::Failed(_)));
        assert!(matches!(model.classifier(), Err(ModelError::NotReady { .. })));
        assert!(model.init().is_err());
    }

    #[test]
    fn background_warmup_reports_through_the_handle() {
        let model = ModelWrapper::with_warmup_delay(
            Arc::new(StubSource::default()),
            Duration::from_millis(100),
        );

        let handle = model.multithreaded_init().expect("spawn");
        assert_eq!(handle.status(), WarmupStatus::Warming);
        assert!(!model.readiness().is_ready());

        handle.join().expect("warm-up");
        assert_eq!(model.status(), WarmupStatus::Ready);
    }

    #[test]
    fn background_failure_is_not_ready() {
        let model = ModelWrapper::new(Arc::new(StubSource { fail: true, ..StubSource::default() }));
        let handle = model.multithreaded_init().expect("spawn");
        assert!(handle.join().is_err());
        assert!(matches!(model.readiness(), Readiness::NotReady { .. }));
    }
}

//! Model feature slice: a small colour-histogram classifier behind a warm-up lifecycle,
//! plus the prediction and background-removal routes.

pub mod classifier;
mod error;
pub mod features;
mod routes;
pub mod segmentation;
pub mod source;
pub mod wrapper;

pub use error::{ModelError, ModelErrorExt};
pub use routes::blueprint;
pub use source::{FileModelSource, ModelSource};
pub use wrapper::{ModelWrapper, WarmupHandle, WarmupStatus};

use dwaste_domain::config::ModelConfig;
use std::sync::Arc;
use std::time::Duration;

/// Creates the model wrapper described by the `model` settings section. Nothing is loaded yet.
#[must_use]
pub fn init(config: &ModelConfig) -> ModelWrapper {
    tracing::info!(path = %config.path.display(), "Model slice initialized");

    ModelWrapper::with_warmup_delay(
        Arc::new(FileModelSource::new(&config.path)),
        Duration::from_millis(config.warmup_delay_ms),
    )
}

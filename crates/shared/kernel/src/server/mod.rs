//! HTTP scaffolding shared by every slice: application state, blueprints, error bodies,
//! health probes and the request middleware driven by the framework settings.

pub mod blueprint;
pub mod cors;
pub mod csrf;
pub mod docs;
pub mod error;
pub mod health;
pub mod mask;
pub mod state;

pub use blueprint::Blueprint;
pub use error::{ApiError, ErrorBody};
pub use health::{AlwaysReady, Readiness, ReadinessProbe};
pub use state::{ApiState, ApiStateBuilder, ApiStateError};

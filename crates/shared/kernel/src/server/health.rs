use super::{ApiState, Blueprint};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::{Json, response::IntoResponse};
use dwaste_domain::constants::HEALTH_TAG;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::LazyLock;
use std::time::Instant;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Whether the service can take traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady { detail: Cow<'static, str> },
}

impl Readiness {
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Source of the readiness answer, usually the model warm-up status.
pub trait ReadinessProbe: Debug + Send + Sync {
    fn readiness(&self) -> Readiness;
}

/// Probe for deployments without a warm-up phase.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysReady;

impl ReadinessProbe for AlwaysReady {
    fn readiness(&self) -> Readiness {
        Readiness::Ready
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Health check response
struct HealthResponse {
    /// Status
    status: &'static str,
    /// Version
    version: &'static str,
    /// Uptime in seconds
    uptime: u64,
    /// Why the service is not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

const NO_CACHE: [(header::HeaderName, &str); 2] = [
    (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
    (header::PRAGMA, "no-cache"),
];

fn body(status: &'static str, detail: Option<String>) -> HealthResponse {
    HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime: START_TIME.elapsed().as_secs(),
        detail,
    }
}

#[utoipa::path(
    get,
    path = "/api/health/liveness",
    responses((status = OK, description = "The process is up", body = HealthResponse)),
    tag = HEALTH_TAG,
)]
pub(super) async fn liveness_handler() -> impl IntoResponse {
    (NO_CACHE, Json(body("alive", None)))
}

#[utoipa::path(
    get,
    path = "/api/health/readiness",
    responses(
        (status = OK, description = "The model is warmed up", body = HealthResponse),
        (status = SERVICE_UNAVAILABLE, description = "Warm-up pending or failed", body = HealthResponse),
    ),
    tag = HEALTH_TAG,
)]
pub(super) async fn readiness_handler(State(state): State<ApiState>) -> impl IntoResponse {
    match state.readiness() {
        Readiness::Ready => (StatusCode::OK, NO_CACHE, Json(body("ready", None))),
        Readiness::NotReady { detail } => (
            StatusCode::SERVICE_UNAVAILABLE,
            NO_CACHE,
            Json(body("not ready", Some(detail.into_owned()))),
        ),
    }
}

/// Liveness and readiness probes.
pub fn blueprint() -> Blueprint<ApiState> {
    Blueprint::new(
        "health",
        OpenApiRouter::new().routes(routes!(liveness_handler)).routes(routes!(readiness_handler)),
    )
}

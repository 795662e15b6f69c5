use super::{ApiError, ApiState, Blueprint};
use crate::security::SecurityError;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::Json;
use axum::response::{IntoResponse, Response};
use dwaste_domain::constants::{CSRF_HEADER, SECURITY_TAG};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

/// Requires a valid `X-CSRFToken` header on unsafe methods when CSRF protection is on.
///
/// # Errors
/// Returns 400 when the token is missing or was not issued by this process.
pub async fn require_csrf_token(
    State(state): State<ApiState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.framework.csrf_enabled || request.method().is_safe() {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SecurityError::CsrfMissing)?;

    state.csrf.verify(token)?;

    Ok(next.run(request).await)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// A freshly issued CSRF token
struct CsrfTokenResponse {
    /// Send back in the `X-CSRFToken` header of unsafe requests
    csrf_token: String,
    /// Whether the server currently enforces the token
    enforced: bool,
}

#[utoipa::path(
    get,
    path = "/api/csrf-token",
    responses((status = OK, description = "Token issued", body = CsrfTokenResponse)),
    tag = SECURITY_TAG,
)]
pub(super) async fn csrf_token_handler(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let body = CsrfTokenResponse {
        csrf_token: state.csrf.issue()?,
        enforced: state.config.framework.csrf_enabled,
    };

    Ok(([(header::CACHE_CONTROL, "no-store")], Json(body)))
}

pub fn blueprint() -> Blueprint<ApiState> {
    Blueprint::new("security", OpenApiRouter::new().routes(routes!(csrf_token_handler)))
}

use crate::security::SecurityError;
use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use dwaste_domain::config::AppConfig;
use dwaste_domain::constants::API_ROOT;
use serde::Serialize;
use std::borrow::Cow;
use tracing::error;
use utoipa::ToSchema;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable description
    pub message: String,
    /// Hint pointing at the API root (only when 404 help is enabled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: Cow<'static, str> },

    #[error("{message}")]
    Forbidden { message: Cow<'static, str> },

    #[error("{message}")]
    NotFound { message: Cow<'static, str>, help: Option<Cow<'static, str>> },

    #[error("{message}")]
    Unavailable { message: Cow<'static, str> },

    #[error("{message}")]
    Internal { message: Cow<'static, str> },
}

impl ApiError {
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Internal { message: message.into() }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let help = match &self {
            Self::NotFound { help, .. } => help.as_ref().map(ToString::to_string),
            _ => None,
        };

        let message = if let Self::Internal { message } = &self {
            error!(error = %message, "Request failed");
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { message, help })).into_response()
    }
}

impl From<SecurityError> for ApiError {
    fn from(e: SecurityError) -> Self {
        match e {
            SecurityError::CsrfMissing | SecurityError::CsrfInvalid { .. } => {
                Self::BadRequest { message: e.to_string().into() }
            },
            SecurityError::Entropy { .. } | SecurityError::Derivation => {
                Self::Internal { message: e.to_string().into() }
            },
        }
    }
}

/// Fallback for unmatched routes.
pub async fn not_found(State(config): State<AppConfig>, uri: Uri) -> ApiError {
    let help = config.framework.error_404_help.then(|| {
        Cow::Owned(format!(
            "The requested URL was not found on the server. Browse {API_ROOT} for the list of endpoints."
        ))
    });

    ApiError::NotFound { message: format!("No resource at {}", uri.path()).into(), help }
}

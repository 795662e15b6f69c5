//! Cross-origin policy for `/api/*`.
//!
//! `CorsLayer` answers preflights and decorates allowed responses, but it never refuses a
//! request on its own. [`reject_foreign_origin`] closes that gap: a request under the API root
//! carrying an `Origin` that is neither allow-listed nor the request's own host is refused
//! with 403, whether or not a route matches it.

use super::ApiError;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dwaste_domain::config::CorsConfig;
use dwaste_domain::constants::{API_ROOT, CSRF_HEADER, FIELDS_MASK_HEADER};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, warn};

/// Origins allowed to call the API from a browser.
#[derive(Debug, Clone)]
pub struct AllowedOrigins(Arc<[String]>);

impl AllowedOrigins {
    #[must_use]
    pub fn new(config: &CorsConfig) -> Self {
        Self(config.allowed_origins.iter().map(|o| o.trim_end_matches('/').to_owned()).collect())
    }

    #[must_use]
    pub fn allows(&self, origin: &str) -> bool {
        self.0.iter().any(|allowed| allowed.eq_ignore_ascii_case(origin))
    }
}

/// Builds the CORS layer from the configured allow-list.
#[must_use]
pub fn layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin.trim_end_matches('/'))
                .inspect_err(|_| warn!(%origin, "Ignoring malformed CORS origin"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(CSRF_HEADER),
            HeaderName::from_static(FIELDS_MASK_HEADER),
        ])
        .max_age(Duration::from_secs(config.max_age_seconds))
}

/// Refuses cross-origin requests to the API from origins outside the allow-list.
///
/// Paths outside the API root pass through untouched, so the layer can wrap the whole router
/// and still cover API paths that have no route.
pub async fn reject_foreign_origin(
    State(allowed): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    if !is_api_path(request.uri().path()) {
        return next.run(request).await;
    }

    let headers = request.headers();

    if let Some(origin) = headers.get(header::ORIGIN) {
        let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
        let permitted = origin
            .to_str()
            .is_ok_and(|origin| allowed.allows(origin) || is_same_origin(origin, host));

        if !permitted {
            debug!(origin = ?origin, path = %request.uri().path(), "Cross-origin request refused");
            return ApiError::Forbidden { message: "Cross-origin request not allowed".into() }
                .into_response();
        }
    }

    next.run(request).await
}

fn is_api_path(path: &str) -> bool {
    path.strip_prefix(API_ROOT).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn is_same_origin(origin: &str, host: Option<&str>) -> bool {
    let Some(host) = host else { return false };
    origin
        .split_once("://")
        .is_some_and(|(_, authority)| authority.trim_end_matches('/').eq_ignore_ascii_case(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_ignores_case_and_trailing_slash() {
        let allowed = AllowedOrigins::new(&CorsConfig {
            allowed_origins: vec!["https://dwaste.live/".to_owned()],
            max_age_seconds: 60,
        });
        assert!(allowed.allows("https://DWASTE.live"));
        assert!(!allowed.allows("https://evil.example"));
    }

    #[test]
    fn only_paths_under_the_api_root_are_in_scope() {
        assert!(is_api_path("/api"));
        assert!(is_api_path("/api/"));
        assert!(is_api_path("/api/does-not-exist"));
        assert!(!is_api_path("/"));
        assert!(!is_api_path("/apidocs"));
        assert!(!is_api_path("/static/api"));
    }

    #[test]
    fn same_origin_compares_authority_with_host() {
        assert!(is_same_origin("http://localhost:8888", Some("localhost:8888")));
        assert!(!is_same_origin("http://localhost:8888", Some("localhost:9999")));
        assert!(!is_same_origin("http://localhost:8888", None));
        assert!(!is_same_origin("null", Some("localhost")));
    }
}

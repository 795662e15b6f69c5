//! `X-Fields` response masking.
//!
//! With field masking enabled, a client may send `X-Fields: label,confidence` and receive only
//! those top-level fields of a JSON object (or of each object in a JSON array).

use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use dwaste_domain::config::AppConfig;
use dwaste_domain::constants::FIELDS_MASK_HEADER;
use serde_json::Value;
use tracing::warn;

const MAX_MASKED_BODY: usize = 16 * 1024 * 1024;

/// A parsed field mask. `{` and `}` wrappers are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMask(Vec<String>);

impl FieldMask {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let inner = raw.trim().trim_start_matches('{').trim_end_matches('}');
        Self(
            inner
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty() || self.0.iter().any(|f| f == "*")
    }

    #[must_use]
    pub fn apply(&self, value: Value) -> Value {
        match value {
            Value::Object(mut map) => {
                map.retain(|key, _| self.0.iter().any(|f| f == key));
                Value::Object(map)
            },
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.apply(v)).collect()),
            other => other,
        }
    }
}

/// Filters JSON response bodies by the request's `X-Fields` header when masking is enabled.
pub async fn apply_field_mask(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Response {
    let mask = config
        .framework
        .mask_swagger
        .then(|| request.headers().get(FIELDS_MASK_HEADER))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .map(FieldMask::parse)
        .filter(|m| !m.is_empty());

    let response = next.run(request).await;

    let Some(mask) = mask else { return response };
    if !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_MASKED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Could not buffer response for field masking");
            return Response::from_parts(parts, Body::empty());
        },
    };

    let masked = serde_json::from_slice::<Value>(&bytes)
        .and_then(|value| serde_json::to_vec(&mask.apply(value)))
        .map_or_else(|_| bytes.to_vec(), |masked| masked);

    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(masked))
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

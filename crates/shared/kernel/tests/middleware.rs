use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use dwaste_kernel::domain::config::{AppConfig, FrameworkConfig, ServerConfig, ServiceConfig};
use dwaste_kernel::security::SecretKey;
use dwaste_kernel::server::cors::{self, AllowedOrigins, reject_foreign_origin};
use dwaste_kernel::server::csrf::{self, require_csrf_token};
use dwaste_kernel::server::error::not_found;
use dwaste_kernel::server::mask::apply_field_mask;
use dwaste_kernel::server::{ApiState, health};
use serde_json::{Value, json};
use tower::ServiceExt;
use utoipa_axum::router::OpenApiRouter;

fn app(framework: FrameworkConfig) -> Router {
    let config = AppConfig::new(framework, ServerConfig::default(), ServiceConfig::default());
    let state = ApiState::builder()
        .config(config.clone())
        .secret(SecretKey::generate().expect("secret"))
        .build()
        .expect("state");

    let (routes, _doc) = OpenApiRouter::<ApiState>::new()
        .merge(health::blueprint().register(&config))
        .merge(csrf::blueprint().register(&config))
        .route(
            "/api/echo",
            post(|| async { axum::Json(json!({ "label": "glass", "confidence": 0.9 })) }),
        )
        .split_for_parts();

    routes
        .layer(from_fn_with_state(state.clone(), require_csrf_token))
        .layer(from_fn_with_state(config.clone(), apply_field_mask))
        .layer(cors::layer(&config.service.cors))
        .layer(from_fn_with_state(AllowedOrigins::new(&config.service.cors), reject_foreign_origin))
        .fallback(not_found)
        .with_state(state)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn echo() -> axum::http::request::Builder {
    Request::builder().method("POST").uri("/api/echo")
}

#[tokio::test]
async fn allow_listed_origin_gets_cors_headers() {
    let response = app(FrameworkConfig::default())
        .oneshot(
            Request::builder()
                .uri("/api/health/liveness")
                .header(header::ORIGIN, "https://www.dwaste.live")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).expect("cors header"),
        "https://www.dwaste.live"
    );
}

#[tokio::test]
async fn foreign_origin_is_refused() {
    let response = app(FrameworkConfig::default())
        .oneshot(
            Request::builder()
                .uri("/api/health/liveness")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn same_origin_request_is_not_cross_origin() {
    let response = app(FrameworkConfig::default())
        .oneshot(
            Request::builder()
                .uri("/api/health/liveness")
                .header(header::HOST, "localhost:8888")
                .header(header::ORIGIN, "http://localhost:8888")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn csrf_enforced_only_when_enabled() {
    let open = app(FrameworkConfig::default())
        .oneshot(echo().body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(open.status(), StatusCode::OK);

    let protected = app(FrameworkConfig { csrf_enabled: true, ..FrameworkConfig::default() });

    let missing = protected
        .clone()
        .oneshot(echo().body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let forged = protected
        .clone()
        .oneshot(echo().header("X-CSRFToken", "AAAA").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(forged.status(), StatusCode::BAD_REQUEST);

    let issued = protected
        .clone()
        .oneshot(Request::builder().uri("/api/csrf-token").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let token = json_body(issued).await["csrfToken"].as_str().expect("token").to_owned();

    let accepted = protected
        .oneshot(echo().header("X-CSRFToken", token).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(accepted.status(), StatusCode::OK);
}

#[tokio::test]
async fn field_mask_applies_only_when_enabled() {
    let masked = app(FrameworkConfig { mask_swagger: true, ..FrameworkConfig::default() })
        .oneshot(echo().header("X-Fields", "label").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(json_body(masked).await, json!({ "label": "glass" }));

    let unmasked = app(FrameworkConfig::default())
        .oneshot(echo().header("X-Fields", "label").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(json_body(unmasked).await["confidence"], 0.9);
}

#[tokio::test]
async fn not_found_help_follows_setting() {
    let plain = app(FrameworkConfig::default())
        .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(plain.status(), StatusCode::NOT_FOUND);
    assert!(json_body(plain).await.get("help").is_none());

    let helped = app(FrameworkConfig { error_404_help: true, ..FrameworkConfig::default() })
        .oneshot(Request::builder().uri("/nowhere").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert!(json_body(helped).await["help"].as_str().expect("help").contains("/api"));
}

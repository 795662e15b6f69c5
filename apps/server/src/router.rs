use anyhow::{Context, Result};
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::response::Redirect;
use axum::routing::get;
use dwaste_domain::config::AppConfig;
use dwaste_domain::constants::API_ROOT;
use dwaste_kernel::server::cors::{self, AllowedOrigins, reject_foreign_origin};
use dwaste_kernel::server::csrf::{self, require_csrf_token};
use dwaste_kernel::server::error::not_found;
use dwaste_kernel::server::mask::apply_field_mask;
use dwaste_kernel::server::{ApiState, Blueprint, docs, health};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[derive(OpenApi)]
#[openapi(info(title = "DWaste API", description = "Waste classification and background removal"))]
struct ApiDoc;

/// The aggregate blueprint: every route the service exposes under `/api`.
pub(crate) fn blueprint() -> Blueprint<ApiState> {
    Blueprint::new("api", OpenApiRouter::new())
        .nest(health::blueprint())
        .nest(csrf::blueprint())
        .nest(dwaste_model::blueprint())
}

/// Registers the aggregate blueprint and wires the middleware the framework settings call for.
///
/// Must be called with the late-setup notice suppressed; see [`crate::Bootstrapper::build`].
pub(crate) fn init(state: &ApiState) -> Result<Router> {
    let config: AppConfig = state.config.clone();

    // Separate the OpenAPI routes and the API documentation object
    let (api_routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(blueprint().register(&config))
        .split_for_parts();

    let swagger = docs::router(&api_doc, &config.framework)
        .context("Failed to render the OpenAPI document")?;

    let api: Router = api_routes
        .layer(from_fn_with_state(state.clone(), require_csrf_token))
        .layer(from_fn_with_state(config.clone(), apply_field_mask))
        .with_state(state.clone())
        .merge(swagger)
        .merge(Scalar::with_url(API_ROOT, api_doc))
        .layer(cors::layer(&config.service.cors));

    let root: Router = Router::<AppConfig>::new()
        .route("/", get(|| async { Redirect::to(API_ROOT) }))
        .fallback(not_found)
        .with_state(config.clone());

    // FLASK_DEBUG promotes request tracing from DEBUG to INFO.
    let level = if config.server.debug { Level::INFO } else { Level::DEBUG };

    // The origin check wraps the merged router so unmatched `/api/*` paths reach it before
    // the root fallback; it ignores paths outside the API root.
    Ok(root
        .merge(api)
        .layer(from_fn_with_state(AllowedOrigins::new(&config.service.cors), reject_foreign_origin))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(level))
                .on_request(DefaultOnRequest::new().level(level))
                .on_response(DefaultOnResponse::new().level(level)),
        ))
}

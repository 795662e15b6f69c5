//! The served `OpenAPI` document, annotated with the documentation UI settings.

use axum::Router;
use axum::body::Bytes;
use axum::http::header;
use axum::routing::get;
use dwaste_domain::config::FrameworkConfig;
use dwaste_domain::constants::OPENAPI_PATH;
use serde_json::Value;
use utoipa::openapi::OpenApi;

/// Renders the document as JSON with `x-doc-expansion`, `x-json-editor` and `x-mask-enabled`
/// extensions at the top level.
///
/// # Errors
/// Returns an error if the document cannot be serialized.
pub fn render(doc: &OpenApi, framework: &FrameworkConfig) -> Result<Bytes, serde_json::Error> {
    let mut value = serde_json::to_value(doc)?;

    if let Value::Object(map) = &mut value {
        map.insert("x-doc-expansion".into(), Value::from(framework.doc_expansion.as_str()));
        map.insert("x-json-editor".into(), Value::from(framework.json_editor));
        map.insert("x-mask-enabled".into(), Value::from(framework.mask_swagger));
    }

    serde_json::to_vec(&value).map(Bytes::from)
}

/// Route serving the rendered document at `/api/swagger.json`.
///
/// # Errors
/// See [`render`].
pub fn router<S>(doc: &OpenApi, framework: &FrameworkConfig) -> Result<Router<S>, serde_json::Error>
where
    S: Clone + Send + Sync + 'static,
{
    let body = render(doc, framework)?;

    Ok(Router::new().route(
        OPENAPI_PATH,
        get(move || {
            let body = body.clone();
            async move { ([(header::CONTENT_TYPE, "application/json")], body) }
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwaste_domain::config::DocExpansion;
    use utoipa::openapi::{Info, OpenApiBuilder};

    #[test]
    fn extensions_reflect_framework_settings() {
        let doc = OpenApiBuilder::new().info(Info::new("test", "1")).build();
        let framework = FrameworkConfig {
            doc_expansion: DocExpansion::Full,
            json_editor: false,
            ..FrameworkConfig::default()
        };

        let bytes = render(&doc, &framework).expect("render");
        let value: Value = serde_json::from_slice(&bytes).expect("json");

        assert_eq!(value["x-doc-expansion"], "full");
        assert_eq!(value["x-json-editor"], false);
        assert_eq!(value["x-mask-enabled"], false);
        assert_eq!(value["info"]["title"], "test");
    }
}

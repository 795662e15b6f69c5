use crate::classifier::{Classifier, Prediction};
use crate::error::ModelError;
use crate::features::{color_histogram, decode_image};
use crate::segmentation::{DEFAULT_THRESHOLD, encode_png_base64, remove_background};
use crate::wrapper::ModelWrapper;
use axum::Json;
use axum::extract::State;
use dwaste_domain::config::AppConfig;
use dwaste_domain::constants::{MODEL_TAG, SEGMENTATION_TAG};
use dwaste_kernel::server::{ApiError, ApiState, Blueprint, ErrorBody};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

#[derive(Debug, Deserialize, ToSchema)]
/// Image to classify
pub(crate) struct PredictRequest {
    /// Base64 encoded PNG or JPEG, optionally as a `data:` URL
    pub(crate) image: String,
}

#[derive(Debug, Deserialize, ToSchema)]
/// Image to segment
pub(crate) struct BackgroundRemovalRequest {
    /// Base64 encoded PNG or JPEG, optionally as a `data:` URL
    pub(crate) image: String,
    /// Background colour distance threshold in `0.0..=1.0`
    #[serde(default)]
    pub(crate) threshold: Option<f32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Image with its background made transparent
pub(crate) struct BackgroundRemovalResponse {
    /// Base64 encoded RGBA PNG
    pub(crate) image: String,
    /// Share of pixels kept as foreground
    pub(crate) foreground_ratio: f32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Background removal followed by classification of the foreground
pub(crate) struct BackgroundRemovalPredictionResponse {
    /// Base64 encoded RGBA PNG
    pub(crate) image: String,
    /// Share of pixels kept as foreground
    pub(crate) foreground_ratio: f32,
    pub(crate) prediction: Prediction,
}

fn check_image(config: &AppConfig, image: &str) -> Result<(), ModelError> {
    if config.framework.validate && image.trim().is_empty() {
        return Err(ModelError::invalid_input("'image' must be a non-empty base64 string"));
    }
    Ok(())
}

fn threshold(config: &AppConfig, requested: Option<f32>) -> Result<f32, ModelError> {
    let value = requested.unwrap_or(DEFAULT_THRESHOLD);
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else if config.framework.validate {
        Err(ModelError::invalid_input(format!("'threshold' must be within 0.0..=1.0, got {value}")))
    } else {
        Ok(value.clamp(0.0, 1.0))
    }
}

fn classifier(state: &ApiState) -> Result<Arc<Classifier>, ApiError> {
    let model = state
        .try_get_slice::<ModelWrapper>()
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(model.classifier()?)
}

/// Runs CPU-bound work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ModelError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("inference task failed: {e}")))?
        .map_err(ApiError::from)
}

#[utoipa::path(
    post,
    path = "/api/model/predict",
    request_body = PredictRequest,
    responses(
        (status = OK, description = "Waste category of the image", body = Prediction),
        (status = BAD_REQUEST, description = "Invalid or undecodable image", body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, description = "Model still warming up", body = ErrorBody),
    ),
    tag = MODEL_TAG,
)]
pub(crate) async fn predict_handler(
    State(state): State<ApiState>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<Prediction>, ApiError> {
    check_image(&state.config, &request.image)?;
    let classifier = classifier(&state)?;

    let prediction = blocking(move || {
        let image = decode_image(&request.image)?;
        let features = color_histogram(&image, classifier.input_size(), classifier.bins());
        classifier.predict(&features)
    })
    .await?;

    debug!(label = %prediction.label, confidence = prediction.confidence, "Prediction served");
    Ok(Json(prediction))
}

#[utoipa::path(
    post,
    path = "/api/segmentation/background-removal",
    request_body = BackgroundRemovalRequest,
    responses(
        (status = OK, description = "Image with transparent background", body = BackgroundRemovalResponse),
        (status = BAD_REQUEST, description = "Invalid or undecodable image", body = ErrorBody),
    ),
    tag = SEGMENTATION_TAG,
)]
pub(crate) async fn background_removal_handler(
    State(state): State<ApiState>,
    Json(request): Json<BackgroundRemovalRequest>,
) -> Result<Json<BackgroundRemovalResponse>, ApiError> {
    check_image(&state.config, &request.image)?;
    let threshold = threshold(&state.config, request.threshold)?;

    let response = blocking(move || {
        let segmentation = remove_background(&decode_image(&request.image)?, threshold);
        Ok(BackgroundRemovalResponse {
            image: encode_png_base64(&segmentation.image)?,
            foreground_ratio: segmentation.foreground_ratio,
        })
    })
    .await?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/model/background-removal-prediction",
    request_body = BackgroundRemovalRequest,
    responses(
        (status = OK, description = "Segmented image and the category of its foreground", body = BackgroundRemovalPredictionResponse),
        (status = BAD_REQUEST, description = "Invalid or undecodable image", body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, description = "Model still warming up", body = ErrorBody),
    ),
    tag = MODEL_TAG,
)]
pub(crate) async fn background_removal_prediction_handler(
    State(state): State<ApiState>,
    Json(request): Json<BackgroundRemovalRequest>,
) -> Result<Json<BackgroundRemovalPredictionResponse>, ApiError> {
    check_image(&state.config, &request.image)?;
    let threshold = threshold(&state.config, request.threshold)?;
    let classifier = classifier(&state)?;

    let response = blocking(move || {
        let segmentation = remove_background(&decode_image(&request.image)?, threshold);
        let foreground = image::DynamicImage::ImageRgba8(segmentation.image);
        let features = color_histogram(&foreground, classifier.input_size(), classifier.bins());
        let prediction = classifier.predict(&features)?;

        Ok(BackgroundRemovalPredictionResponse {
            image: encode_png_base64(foreground.as_rgba8().ok_or_else(|| {
                ModelError::internal("segmented image lost its alpha channel")
            })?)?,
            foreground_ratio: segmentation.foreground_ratio,
            prediction,
        })
    })
    .await?;

    Ok(Json(response))
}

/// Inference and segmentation routes.
pub fn blueprint() -> Blueprint<ApiState> {
    Blueprint::new(
        "model",
        OpenApiRouter::new()
            .routes(routes!(predict_handler))
            .routes(routes!(background_removal_handler))
            .routes(routes!(background_removal_prediction_handler)),
    )
    .on_setup("announce_validation", |config| {
        info!(validate = config.framework.validate, "Inference payload validation configured");
    })
}

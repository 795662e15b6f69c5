use crate::error::ModelError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

/// Decodes a base64 payload (optionally a `data:` URL) into an image.
///
/// # Errors
/// Returns [`ModelError::Decode`] for invalid base64 or unsupported image data.
pub fn decode_image(payload: &str) -> Result<DynamicImage, ModelError> {
    let encoded = payload.split_once(";base64,").map_or(payload, |(_, data)| data);
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| ModelError::decode(format!("payload is not base64: {e}")))?;

    image::load_from_memory(&bytes).map_err(|e| ModelError::decode(format!("unsupported image: {e}")))
}

/// Normalized per-channel histogram of the image resized to `size`×`size`.
///
/// Fully transparent pixels are ignored, so a background-removed image is described by its
/// foreground alone. Output layout is `[r_0..r_bins, g_0..g_bins, b_0..b_bins]`.
#[must_use]
pub fn color_histogram(image: &DynamicImage, size: u32, bins: usize) -> Vec<f32> {
    let resized: RgbaImage = imageops::resize(&image.to_rgba8(), size, size, FilterType::Triangle);

    let mut histogram = vec![0.0_f32; bins * 3];
    let mut counted = 0_u32;

    for pixel in resized.pixels().filter(|p| p[3] > 0) {
        counted += 1;
        for channel in 0..3 {
            let bin = usize::from(pixel[channel]) * bins / 256;
            histogram[channel * bins + bin] += 1.0;
        }
    }

    if counted > 0 {
        let total = counted as f32;
        for value in &mut histogram {
            *value /= total;
        }
    }
    histogram
}

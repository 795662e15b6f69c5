//! Border-sampled background removal.
//!
//! The background colour is estimated as the per-channel median of the image border; pixels
//! close to it (normalized RGB distance below the threshold) become fully transparent.

use crate::error::ModelError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

pub const DEFAULT_THRESHOLD: f32 = 0.12;

// Largest possible RGB distance: sqrt(3 * 255^2).
const MAX_DISTANCE: f32 = 441.672_94;

#[derive(Debug, Clone)]
pub struct Segmentation {
    pub image: RgbaImage,
    /// Share of pixels kept as foreground.
    pub foreground_ratio: f32,
}

#[must_use]
pub fn remove_background(image: &DynamicImage, threshold: f32) -> Segmentation {
    let mut rgba = image.to_rgba8();
    let background = border_median(&rgba);
    let total = rgba.width() as usize * rgba.height() as usize;
    let mut kept = 0_usize;

    for pixel in rgba.pixels_mut() {
        if distance(pixel, background) / MAX_DISTANCE < threshold {
            pixel[3] = 0;
        } else if pixel[3] > 0 {
            kept += 1;
        }
    }

    let foreground_ratio = if total == 0 { 0.0 } else { kept as f32 / total as f32 };
    Segmentation { image: rgba, foreground_ratio }
}

/// Encodes an RGBA image as base64 PNG.
///
/// # Errors
/// Returns [`ModelError::Internal`] if PNG encoding fails.
pub fn encode_png_base64(image: &RgbaImage) -> Result<String, ModelError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ModelError::internal(format!("PNG encoding failed: {e}")))?;
    Ok(STANDARD.encode(bytes))
}

fn border_median(image: &RgbaImage) -> [u8; 3] {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return [0; 3];
    }

    let border = image
        .enumerate_pixels()
        .filter(|(x, y, _)| *x == 0 || *y == 0 || *x == w - 1 || *y == h - 1)
        .map(|(_, _, p)| p);

    let mut channels: [Vec<u8>; 3] = Default::default();
    for pixel in border {
        for (c, values) in channels.iter_mut().enumerate() {
            values.push(pixel[c]);
        }
    }

    channels.map(|mut values| {
        values.sort_unstable();
        values[values.len() / 2]
    })
}

fn distance(pixel: &Rgba<u8>, background: [u8; 3]) -> f32 {
    pixel.0[..3]
        .iter()
        .zip(background)
        .map(|(&p, b)| {
            let d = f32::from(p) - f32::from(b);
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

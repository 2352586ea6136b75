//! PNG snapshot encoding and downscaling.
//!
//! The board raster is shipped to the model as base64 PNG, shrunk so its
//! longer dimension stays within the configured maximum. Handwriting
//! survives the downscale; full-resolution uploads mostly waste tokens.

use std::io::Cursor;

use base64::Engine;
use image::{ImageFormat, RgbaImage, imageops};
use tracing::{debug, warn};

use sketchsolve_core::protocol::strip_data_url_prefix;
use sketchsolve_core::{Result, SketchsolveError};

pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode a raster as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| SketchsolveError::Image(format!("PNG encode failed: {e}")))?;
    Ok(bytes)
}

/// Encode a raster as base64 PNG, no data URL prefix.
pub fn encode_base64_png(img: &RgbaImage) -> Result<String> {
    let bytes = encode_png(img)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
}

/// Encode a raster as a PNG data URL, the shape a canvas `toDataURL`
/// produces.
pub fn to_data_url(img: &RgbaImage) -> Result<String> {
    Ok(format!("{DATA_URL_PREFIX}{}", encode_base64_png(img)?))
}

/// Decode a base64 image, tolerating a data URL prefix. Corrupt input is an
/// immediate typed error, never a hang.
pub fn decode_base64_image(data: &str) -> Result<RgbaImage> {
    let payload = strip_data_url_prefix(data.trim());
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| SketchsolveError::Image(format!("Invalid base64 image: {e}")))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| SketchsolveError::Image(format!("Invalid image data: {e}")))?;
    Ok(img.to_rgba8())
}

/// Compute the downscaled size: longer dimension capped at `max_dim`, aspect
/// ratio preserved within rounding, both dimensions at least 1. Sizes
/// already within bounds come back unchanged.
pub fn target_dimensions(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }
    if width >= height {
        let scaled = (height as f64 * max_dim as f64 / width as f64).round() as u32;
        (max_dim, scaled.max(1))
    } else {
        let scaled = (width as f64 * max_dim as f64 / height as f64).round() as u32;
        (scaled.max(1), max_dim)
    }
}

/// Shrink a raster so its longer dimension does not exceed `max_dim`.
pub fn downscale_to_fit(img: &RgbaImage, max_dim: u32) -> RgbaImage {
    let (w, h) = (img.width(), img.height());
    let (tw, th) = target_dimensions(w, h, max_dim);
    if (tw, th) == (w, h) {
        return img.clone();
    }
    debug!(
        width = w,
        height = h,
        target_width = tw,
        target_height = th,
        "Downscaling snapshot"
    );
    imageops::resize(img, tw, th, imageops::FilterType::Triangle)
}

/// Normalize an uploaded snapshot for the provider: decode, downscale,
/// re-encode as base64 PNG. Payloads that fail to decode are forwarded
/// untouched (minus any data URL prefix) so the provider still sees exactly
/// what the client sent.
pub fn prepare_for_analysis(image_base64: &str, max_dim: u32) -> String {
    match decode_base64_image(image_base64) {
        Ok(img) => {
            let scaled = downscale_to_fit(&img, max_dim);
            match encode_base64_png(&scaled) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!(error = %e, "Snapshot re-encode failed, forwarding original payload");
                    strip_data_url_prefix(image_base64).to_string()
                }
            }
        }
        Err(e) => {
            warn!(error = %e, "Snapshot decode failed, forwarding original payload");
            strip_data_url_prefix(image_base64).to_string()
        }
    }
}

//! Image normalisation: `DynamicImage` → bounded JPEG → base64.
//!
//! Vision APIs bill and rate-limit by image size, and a 12-megapixel phone
//! photo of a passport carries no more legible text than a 1024 px one.
//! Every image is therefore fitted inside a square bound (never upscaled)
//! and re-encoded as JPEG before it leaves the process.

use crate::error::DocumentError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// A normalised JPEG ready for a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Encoded JPEG bytes.
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RasterImage {
    /// MIME type of [`RasterImage::jpeg`].
    pub const MIME_TYPE: &'static str = "image/jpeg";

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.jpeg)
    }
}

/// Shrink `img` to fit within `max_dim` × `max_dim`, preserving aspect ratio.
///
/// Images already inside the bound are returned unchanged.
pub fn fit_within(img: DynamicImage, max_dim: u32) -> DynamicImage {
    if img.width() <= max_dim && img.height() <= max_dim {
        return img;
    }
    img.resize(max_dim, max_dim, FilterType::CatmullRom)
}

/// Fit `img` inside the bound and encode it as JPEG at `quality`.
pub fn normalise(img: DynamicImage, max_dim: u32, quality: u8) -> Result<RasterImage, DocumentError> {
    let (orig_w, orig_h) = (img.width(), img.height());
    let fitted = fit_within(img, max_dim);

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(fitted.to_rgb8());
    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))
        .map_err(|e| DocumentError::ImageDecode {
            detail: format!("JPEG encoding failed: {e}"),
        })?;

    debug!(
        "Normalised image {}x{} → {}x{} ({} bytes JPEG)",
        orig_w,
        orig_h,
        rgb.width(),
        rgb.height(),
        jpeg.len()
    );

    Ok(RasterImage {
        jpeg,
        width: rgb.width(),
        height: rgb.height(),
    })
}

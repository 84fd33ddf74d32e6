//! QR rendering for provisioning URIs.
//!
//! The core's contribution is the URI text; this module is the boundary to
//! the image collaborator. The `qrcode` crate produces the module matrix
//! and the `image` crate encodes it as a PNG sized to fit the requested
//! pixel target.

use image::{GrayImage, Luma};
use qrcode::QrCode;

use crate::types::{TotpError, TotpErrorKind};

/// Default output size in pixels.
pub const DEFAULT_SIZE_PX: u32 = 300;
/// Quiet-zone border width in modules.
const QUIET_ZONE: u32 = 4;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PNG rendering
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Render text as a QR code PNG, scaled to the largest whole-module size
/// that fits within `size_px` (at least one pixel per module).
pub fn uri_to_png(text: &str, size_px: u32) -> Result<Vec<u8>, TotpError> {
    let code = QrCode::new(text.as_bytes()).map_err(|e| {
        log::warn!("QR encoding failed: {}", e);
        TotpError::new(TotpErrorKind::QrEncodeFailed, "QR encoding failed")
            .with_detail(e.to_string())
    })?;

    let modules = code.to_colors();
    let width = code.width() as u32;
    let total_modules = width + QUIET_ZONE * 2;
    let scale = (size_px / total_modules).max(1);
    let img_size = total_modules * scale;

    let mut img = GrayImage::from_pixel(img_size, img_size, Luma([255u8]));
    for y in 0..width {
        for x in 0..width {
            if modules[(y * width + x) as usize] != qrcode::Color::Dark {
                continue;
            }
            let base_x = (x + QUIET_ZONE) * scale;
            let base_y = (y + QUIET_ZONE) * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(base_x + dx, base_y + dy, Luma([0u8]));
                }
            }
        }
    }

    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img_size,
        img_size,
        image::ExtendedColorType::L8,
    )
    .map_err(|e| {
        TotpError::new(TotpErrorKind::QrEncodeFailed, "PNG encoding failed")
            .with_detail(e.to_string())
    })?;

    Ok(buf)
}

/// Render text as a base64-encoded QR PNG.
pub fn uri_to_base64_png(text: &str, size_px: u32) -> Result<String, TotpError> {
    use base64::Engine;
    let png = uri_to_png(text, size_px)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}

/// Render text as a `data:image/png;base64,...` URI for direct embedding.
pub fn uri_to_data_uri(text: &str, size_px: u32) -> Result<String, TotpError> {
    Ok(format!("data:image/png;base64,{}", uri_to_base64_png(text, size_px)?))
}

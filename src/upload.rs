//! Receipt image validation.
//!
//! Uploaded bytes are checked before anything is sent to the AI provider:
//! size first, then the format is detected from magic bytes with
//! `image::guess_format` and checked against its own limit.

use image::ImageFormat;
use tracing::{debug, info};

use crate::config::UploadLimits;
use crate::errors::{AppError, AppResult};

/// A receipt image that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptImage {
    pub format: ImageFormat,
    pub mime_type: &'static str,
}

fn mime_type(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

fn format_limit(format: ImageFormat, limits: &UploadLimits) -> u64 {
    match format {
        ImageFormat::Png => limits.png_max,
        ImageFormat::Jpeg => limits.jpeg_max,
        ImageFormat::WebP => limits.webp_max,
        _ => 0,
    }
}

/// Check an uploaded receipt and detect its format
pub fn validate_receipt_image(bytes: &[u8], limits: &UploadLimits) -> AppResult<ReceiptImage> {
    if bytes.is_empty() {
        return Err(AppError::Validation("Receipt image is empty".to_string()));
    }

    let size = bytes.len() as u64;
    if size > limits.max_bytes {
        return Err(AppError::Validation(format!(
            "Receipt image is too large ({size} bytes, limit {} bytes)",
            limits.max_bytes
        )));
    }

    if bytes.len() < limits.min_format_bytes {
        return Err(AppError::Validation(format!(
            "Receipt image is too small to identify ({size} bytes, need at least {})",
            limits.min_format_bytes
        )));
    }

    let format = image::guess_format(bytes).map_err(|e| {
        debug!(error = %e, "Could not determine image format");
        AppError::Validation("Unrecognised image format, use PNG, JPEG or WebP".to_string())
    })?;

    let Some(mime_type) = mime_type(format) else {
        info!(?format, "Rejected unsupported receipt format");
        return Err(AppError::Validation(format!(
            "Unsupported image format {format:?}, use PNG, JPEG or WebP"
        )));
    };

    let limit = format_limit(format, limits);
    if size > limit {
        return Err(AppError::Validation(format!(
            "{format:?} receipt is too large ({size} bytes, limit {limit} bytes)"
        )));
    }

    info!(?format, size, "Receipt image accepted");
    Ok(ReceiptImage { format, mime_type })
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Still-image plumbing: decode photos into pixel buffers, guard buffer sizes,
// and encode rectified output as PNG or JPEG.

use std::path::Path;

use docquad_core::{Result, ScanError};
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Encoded output container for a rectified page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    /// Guess from a file extension (`png`, `jpg`, `jpeg`; case-insensitive).
    pub fn from_extension(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    /// JPEG quality, 1-100. Ignored for PNG.
    pub quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 92,
        }
    }
}

/// Fail with [`ScanError::ResourceExhausted`] when `width * height` exceeds
/// `max_pixels`, and with [`ScanError::InvalidInput`] on a zero dimension.
pub fn ensure_within_limit(width: u32, height: u32, max_pixels: u64) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ScanError::invalid(format!(
            "image has zero size ({width}x{height})"
        )));
    }
    if width as u64 * height as u64 > max_pixels {
        return Err(ScanError::ResourceExhausted {
            width,
            height,
            limit: max_pixels,
        });
    }
    Ok(())
}

/// Read and decode an image file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let data = std::fs::read(path.as_ref())?;
    let img = decode_image(&data)?;
    info!(width = img.width(), height = img.height(), "Image loaded");
    Ok(img)
}

/// Decode an in-memory image (JPEG, PNG, etc.).
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(data)
        .map_err(|err| ScanError::ImageError(format!("failed to decode image: {err}")))?;
    debug!(
        width = img.width(),
        height = img.height(),
        "Image decoded from bytes"
    );
    Ok(img)
}

/// Encode an RGBA buffer with the given options.
pub fn encode_rgba(image: &RgbaImage, options: ExportOptions) -> Result<Vec<u8>> {
    match options.format {
        ExportFormat::Png => {
            let mut buffer = Vec::new();
            let mut cursor = std::io::Cursor::new(&mut buffer);
            image
                .write_to(&mut cursor, ImageFormat::Png)
                .map_err(|err| ScanError::ImageError(format!("PNG encoding failed: {err}")))?;
            Ok(buffer)
        }
        ExportFormat::Jpeg => {
            // JPEG has no alpha channel.
            let quality = options.quality.clamp(1, 100);
            let mut buffer = Vec::new();
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|err| ScanError::ImageError(format!("JPEG encoding failed: {err}")))?;
            Ok(buffer)
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec — turns encoded photographs into RGBA rasters for the scan
// pipeline and encodes finished pages back to PNG or JPEG, using the `image`
// crate.

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use inksign_core::error::{InksignError, Result};
use tracing::{debug, instrument};

/// Decode encoded bytes (JPEG, PNG, TIFF, ...) into an RGBA raster.
///
/// Zero-area images are rejected as `InvalidInput`.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(data).map_err(|err| {
        InksignError::ImageError(format!("failed to decode image: {}", err))
    })?;
    into_rgba(image)
}

/// Load and decode an image file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let image = image::open(path.as_ref()).map_err(|err| {
        InksignError::ImageError(format!(
            "failed to open {}: {}",
            path.as_ref().display(),
            err
        ))
    })?;
    into_rgba(image)
}

fn into_rgba(image: DynamicImage) -> Result<RgbaImage> {
    if image.width() == 0 || image.height() == 0 {
        return Err(InksignError::InvalidInput(format!(
            "decoded image is {}x{}",
            image.width(),
            image.height()
        )));
    }
    debug!(
        width = image.width(),
        height = image.height(),
        "Image decoded"
    );
    Ok(image.to_rgba8())
}

/// Encode a raster as PNG bytes. Transparency is kept.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image.write_to(&mut cursor, ImageFormat::Png).map_err(|err| {
        InksignError::ImageError(format!("PNG encoding failed: {}", err))
    })?;
    Ok(buffer)
}

/// Encode a raster as JPEG bytes with the given quality (1-100).
///
/// JPEG has no alpha channel; transparent pixels keep their colour.
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    rgb.write_with_encoder(encoder).map_err(|err| {
        InksignError::ImageError(format!("JPEG encoding failed: {}", err))
    })?;
    Ok(buffer)
}

/// Write a raster to a file; the format follows the extension.
pub fn save(image: &RgbaImage, path: impl AsRef<Path>) -> Result<()> {
    image.save(path.as_ref()).map_err(|err| {
        InksignError::ImageError(format!(
            "failed to save image to {}: {}",
            path.as_ref().display(),
            err
        ))
    })
}

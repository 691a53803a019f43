// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Luminance conversion and noise smoothing — the first stage of document
// detection. Paper texture and sensor noise are blurred away so the edge stage
// only responds to the page boundary.

use image::{GrayImage, Luma, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use inksign_core::error::{InksignError, Result};
use tracing::{debug, instrument};

/// Perceptual weights for R, G and B. Every grayscale conversion in the
/// pipeline uses these.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Luminance of a single RGB triple, rounded to the nearest level.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMA_WEIGHTS[0] * r as f32 + LUMA_WEIGHTS[1] * g as f32 + LUMA_WEIGHTS[2] * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// Convert an RGBA raster to a luminance raster. Alpha is ignored.
pub fn to_luminance(image: &RgbaImage) -> Result<GrayImage> {
    ensure_non_empty(image.width(), image.height())?;
    Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        Luma([luma(r, g, b)])
    }))
}

/// Convert to luminance and apply a Gaussian blur of the given radius.
///
/// The kernel spans roughly two standard deviations either side of the centre,
/// so `sigma = radius / 2`. A radius of zero skips the blur.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn smooth(image: &RgbaImage, blur_radius: u32) -> Result<GrayImage> {
    let gray = to_luminance(image)?;
    if blur_radius == 0 {
        return Ok(gray);
    }
    let sigma = blur_radius as f32 / 2.0;
    let blurred = gaussian_blur_f32(&gray, sigma);
    debug!(blur_radius, sigma, "Luminance smoothed");
    Ok(blurred)
}

pub(crate) fn ensure_non_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(InksignError::InvalidInput(format!(
            "raster must have positive dimensions, got {width}x{height}"
        )));
    }
    Ok(())
}

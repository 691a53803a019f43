// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gradient magnitude — Sobel responses combined into a single 0..=255 edge
// field that the corner stage thresholds.

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use inksign_core::error::Result;
use tracing::{debug, instrument};

use super::luminance::ensure_non_empty;

/// Compute `sqrt(gx² + gy²)` clamped to 255 for every interior pixel.
///
/// The one-pixel border has no full 3x3 neighbourhood and is left at zero.
#[instrument(skip(gray), fields(width = gray.width(), height = gray.height()))]
pub fn gradient_magnitude(gray: &GrayImage) -> Result<GrayImage> {
    let (width, height) = gray.dimensions();
    ensure_non_empty(width, height)?;

    let mut field = GrayImage::new(width, height);
    if width < 3 || height < 3 {
        return Ok(field);
    }

    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let dx = gx.get_pixel(x, y).0[0] as f32;
            let dy = gy.get_pixel(x, y).0[0] as f32;
            let magnitude = (dx * dx + dy * dy).sqrt().min(255.0);
            field.put_pixel(x, y, Luma([magnitude as u8]));
        }
    }

    debug!("Edge field computed");
    Ok(field)
}

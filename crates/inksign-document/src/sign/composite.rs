// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signature placement — alpha-blends a captured signature raster onto a page.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use inksign_core::error::{InksignError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Where a signature goes on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Page x of the signature's top-left corner. May be negative.
    pub x: i64,
    /// Page y of the signature's top-left corner. May be negative.
    pub y: i64,
    /// Uniform scale applied to the signature before placement.
    pub scale: f32,
}

impl Placement {
    pub fn at(x: i64, y: i64) -> Self {
        Self { x, y, scale: 1.0 }
    }

    pub fn with_scale(self, scale: f32) -> Self {
        Self { scale, ..self }
    }
}

/// Blend `signature` over `page` ("source over"), returning a new page.
///
/// Parts of the signature that land outside the page are clipped. Opaque page
/// pixels stay opaque.
#[instrument(skip(page, signature), fields(page_w = page.width(), page_h = page.height()))]
pub fn composite_signature(
    page: &RgbaImage,
    signature: &RgbaImage,
    placement: Placement,
) -> Result<RgbaImage> {
    if !(placement.scale.is_finite() && placement.scale > 0.0) {
        return Err(InksignError::InvalidInput(format!(
            "signature scale must be positive, got {}",
            placement.scale
        )));
    }
    if signature.width() == 0 || signature.height() == 0 {
        return Err(InksignError::InvalidInput("signature raster is empty".into()));
    }

    let mut out = page.clone();
    if (placement.scale - 1.0).abs() < f32::EPSILON {
        imageops::overlay(&mut out, signature, placement.x, placement.y);
    } else {
        let width = ((signature.width() as f32 * placement.scale).round() as u32).max(1);
        let height = ((signature.height() as f32 * placement.scale).round() as u32).max(1);
        let scaled = imageops::resize(signature, width, height, FilterType::Triangle);
        debug!(width, height, "Signature rescaled");
        imageops::overlay(&mut out, &scaled, placement.x, placement.y);
    }

    // `overlay` blends in floats and can round an opaque result down to 254;
    // source-over onto an opaque pixel is always opaque.
    for (blended, original) in out.pixels_mut().zip(page.pixels()) {
        if original.0[3] == u8::MAX {
            blended.0[3] = u8::MAX;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const INK: Rgba<u8> = Rgba([10, 20, 120, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    /// Blending goes through normalised floats, so allow a level of drift.
    fn assert_close(actual: &Rgba<u8>, expected: Rgba<u8>) {
        let close = actual
            .0
            .iter()
            .zip(expected.0)
            .all(|(a, e)| (*a as i16 - e as i16).abs() <= 2);
        assert!(close, "{:?} != {:?}", actual, expected);
    }

    fn stroke() -> RgbaImage {
        // A 4x2 signature: ink on the top row, transparent below.
        RgbaImage::from_fn(4, 2, |_, y| if y == 0 { INK } else { CLEAR })
    }

    #[test]
    fn opaque_ink_replaces_and_clear_keeps_page() {
        let page = RgbaImage::from_pixel(10, 10, WHITE);
        let out = composite_signature(&page, &stroke(), Placement::at(3, 5)).unwrap();
        assert_close(out.get_pixel(3, 5), INK);
        assert_close(out.get_pixel(6, 5), INK);
        assert_eq!(*out.get_pixel(3, 6), WHITE);
        assert_eq!(*out.get_pixel(7, 5), WHITE);
        // The input page is untouched.
        assert_eq!(*page.get_pixel(3, 5), WHITE);
    }

    #[test]
    fn half_transparent_ink_blends() {
        let page = RgbaImage::from_pixel(2, 2, WHITE);
        let sig = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let out = composite_signature(&page, &sig, Placement::at(0, 0)).unwrap();
        let px = out.get_pixel(0, 0).0;
        assert!((120..=135).contains(&px[0]), "blended = {:?}", px);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn translucent_ink_keeps_opaque_page_opaque() {
        let page = RgbaImage::from_pixel(3, 1, WHITE);
        for alpha in [1u8, 64, 128, 200, 254] {
            let sig = RgbaImage::from_pixel(3, 1, Rgba([30, 40, 50, alpha]));
            let out = composite_signature(&page, &sig, Placement::at(0, 0)).unwrap();
            for px in out.pixels() {
                assert_eq!(px.0[3], 255, "ink alpha {alpha}");
            }
        }
    }

    #[test]
    fn transparent_page_keeps_blended_alpha() {
        let page = RgbaImage::from_pixel(1, 1, CLEAR);
        let sig = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let out = composite_signature(&page, &sig, Placement::at(0, 0)).unwrap();
        let alpha = out.get_pixel(0, 0).0[3];
        assert!((126..=130).contains(&alpha), "alpha = {alpha}");
    }

    #[test]
    fn off_page_parts_are_clipped() {
        let page = RgbaImage::from_pixel(4, 4, WHITE);
        let out = composite_signature(&page, &stroke(), Placement::at(-2, 3)).unwrap();
        assert_close(out.get_pixel(0, 3), INK);
        assert_close(out.get_pixel(1, 3), INK);
        assert_eq!(*out.get_pixel(2, 3), WHITE);
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn scaling_changes_footprint() {
        let page = RgbaImage::from_pixel(20, 20, WHITE);
        let sig = RgbaImage::from_pixel(4, 4, INK);
        let out = composite_signature(&page, &sig, Placement::at(0, 0).with_scale(2.0)).unwrap();
        assert_close(out.get_pixel(7, 7), INK);
        assert_eq!(*out.get_pixel(8, 8), WHITE);
    }

    #[test]
    fn non_positive_scale_rejected() {
        let page = RgbaImage::from_pixel(4, 4, WHITE);
        for scale in [0.0, -1.0, f32::NAN] {
            let err = composite_signature(&page, &stroke(), Placement::at(0, 0).with_scale(scale))
                .unwrap_err();
            assert!(matches!(err, InksignError::InvalidInput(_)));
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rectifier — inverse-maps every output pixel through the homography and
// samples the photograph bilinearly.

use image::{Rgba, RgbaImage};
use inksign_core::error::{InksignError, Result};
use inksign_core::types::Quadrilateral;
use tracing::{debug, info, instrument};

use super::homography::Homography;
use super::luminance::ensure_non_empty;

/// An output side may be at most this many times the photograph's longer side.
pub const MAX_OUTPUT_SCALE: u64 = 4;

/// Output size implied by a source quadrilateral: the longer of the top and
/// bottom edges by the longer of the left and right edges, rounded.
pub fn default_output_size(quad: &Quadrilateral) -> (u32, u32) {
    let edges = quad.edge_lengths();
    let width = edges.top.max(edges.bottom).round().max(1.0);
    let height = edges.left.max(edges.right).round().max(1.0);
    (width as u32, height as u32)
}

/// Reject output sizes that are empty or far larger than the photograph.
///
/// Huge sizes come from corners placed far outside the image and would
/// otherwise request a multi-gigapixel buffer.
pub fn ensure_output_size(
    out_width: u32,
    out_height: u32,
    src_width: u32,
    src_height: u32,
) -> Result<()> {
    ensure_non_empty(out_width, out_height)?;
    let limit = MAX_OUTPUT_SCALE * u64::from(src_width.max(src_height));
    if u64::from(out_width) > limit || u64::from(out_height) > limit {
        return Err(InksignError::InvalidInput(format!(
            "output {out_width}x{out_height} exceeds {limit} pixels per side for a \
             {src_width}x{src_height} photograph"
        )));
    }
    Ok(())
}

/// Produce an `out_width` x `out_height` raster by sampling `source` at
/// `homography(x, y)` for every output pixel.
///
/// Output pixels whose source position falls outside the photograph stay
/// fully transparent. Sampled pixels are opaque.
#[instrument(skip(source, homography), fields(src_w = source.width(), src_h = source.height()))]
pub fn rectify(
    source: &RgbaImage,
    homography: &Homography,
    out_width: u32,
    out_height: u32,
) -> Result<RgbaImage> {
    ensure_non_empty(source.width(), source.height())?;
    ensure_output_size(out_width, out_height, source.width(), source.height())?;

    let mut output = RgbaImage::new(out_width, out_height);
    let mut skipped = 0usize;

    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let src = homography.apply(x as f64, y as f64);
        match sample_bilinear(source, src.x, src.y) {
            Some(sampled) => *pixel = sampled,
            None => skipped += 1,
        }
    }

    debug!(skipped, "Pixels outside the photograph left transparent");
    info!(out_width, out_height, "Rectification complete");
    Ok(output)
}

/// Bilinear sample at a fractional position, or `None` outside
/// `[0, width) x [0, height)`.
///
/// Neighbours past the last row or column reuse the edge pixel. Alpha is
/// forced to 255.
pub fn sample_bilinear(image: &RgbaImage, x: f64, y: f64) -> Option<Rgba<u8>> {
    let (width, height) = image.dimensions();
    if !(x >= 0.0 && y >= 0.0 && x < width as f64 && y < height as f64) {
        return None;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = image.get_pixel(x0, y0).0;
    let p10 = image.get_pixel(x1, y0).0;
    let p01 = image.get_pixel(x0, y1).0;
    let p11 = image.get_pixel(x1, y1).0;

    let w00 = (1.0 - fx) * (1.0 - fy);
    let w10 = fx * (1.0 - fy);
    let w01 = (1.0 - fx) * fy;
    let w11 = fx * fy;

    let mut out = [0u8, 0, 0, 255];
    for c in 0..3 {
        let v = p00[c] as f64 * w00 + p10[c] as f64 * w10 + p01[c] as f64 * w01 + p11[c] as f64 * w11;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgba(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use inksign_core::error::InksignError;
    use inksign_core::types::Point;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn gradient_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 7 % 256) as u8, (y * 3 % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    #[test]
    fn default_size_uses_longer_edges() {
        let quad = Quadrilateral::new([p(40.0, 30.0), p(360.0, 50.0), p(350.0, 580.0), p(50.0, 560.0)]);
        let (w, h) = default_output_size(&quad);
        // Top edge is sqrt(320² + 20²) ≈ 320.6, both sides ≈ 530.1.
        assert_eq!((w, h), (321, 530));
    }

    #[test]
    fn far_away_corners_saturate_but_are_rejected() {
        let quad = Quadrilateral::new([p(0.0, 0.0), p(1e12, 0.0), p(1e12, 1e12), p(0.0, 1e12)]);
        let (w, h) = default_output_size(&quad);
        assert_eq!((w, h), (u32::MAX, u32::MAX));

        let src = gradient_image(8, 8);
        let err = rectify(&src, &Homography::IDENTITY, w, h).unwrap_err();
        assert!(matches!(err, InksignError::InvalidInput(_)));
    }

    #[test]
    fn output_size_limit_follows_longer_source_side() {
        assert!(ensure_output_size(400, 40, 100, 20).is_ok());
        assert!(ensure_output_size(40, 400, 100, 20).is_ok());
        assert!(matches!(
            ensure_output_size(401, 10, 100, 20),
            Err(InksignError::InvalidInput(_))
        ));
    }

    #[test]
    fn identity_rectification_reproduces_source() {
        let src = gradient_image(64, 48);
        let bounds = Quadrilateral::from_image_bounds(64, 48);
        let h = Homography::solve(&bounds, &bounds).unwrap();
        let (w, hgt) = default_output_size(&bounds);
        assert_eq!((w, hgt), (64, 48));

        let out = rectify(&src, &h, w, hgt).unwrap();
        for (x, y, px) in out.enumerate_pixels() {
            assert_eq!(px, src.get_pixel(x, y), "pixel ({x}, {y})");
        }
    }

    #[test]
    fn out_of_range_pixels_stay_transparent() {
        let src = RgbaImage::from_pixel(10, 10, Rgba([200, 100, 50, 255]));
        // Shift everything 5px right: the right half samples past the edge.
        let h = Homography::solve(
            &Quadrilateral::new([p(5.0, 0.0), p(15.0, 0.0), p(15.0, 10.0), p(5.0, 10.0)]),
            &Quadrilateral::from_image_bounds(10, 10),
        )
        .unwrap();
        let out = rectify(&src, &h, 10, 10).unwrap();
        assert_eq!(*out.get_pixel(0, 0), Rgba([200, 100, 50, 255]));
        assert_eq!(*out.get_pixel(4, 9), Rgba([200, 100, 50, 255]));
        assert_eq!(*out.get_pixel(6, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*out.get_pixel(9, 9), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn bilinear_weights_mix_neighbours() {
        let mut src = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([100, 0, 0, 255]));
        src.put_pixel(0, 1, Rgba([0, 200, 0, 255]));
        src.put_pixel(1, 1, Rgba([100, 200, 40, 255]));

        let mid = sample_bilinear(&src, 0.5, 0.5).unwrap();
        assert_eq!(mid, Rgba([50, 100, 10, 255]));

        let quarter = sample_bilinear(&src, 0.25, 0.0).unwrap();
        assert_eq!(quarter, Rgba([25, 0, 0, 255]));
    }

    #[test]
    fn sampling_forces_opaque_alpha() {
        let src = RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 0]));
        assert_eq!(sample_bilinear(&src, 1.0, 1.0), Some(Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn sampling_rejects_negative_and_far_edges() {
        let src = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]));
        assert!(sample_bilinear(&src, -0.01, 1.0).is_none());
        assert!(sample_bilinear(&src, 1.0, 3.0).is_none());
        assert!(sample_bilinear(&src, f64::NAN, 1.0).is_none());
        // The last column is in range and reuses itself as the right neighbour.
        assert_eq!(sample_bilinear(&src, 2.5, 2.5), Some(Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn zero_sized_output_is_invalid() {
        let src = RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]));
        let err = rectify(&src, &Homography::IDENTITY, 0, 5).unwrap_err();
        assert!(matches!(err, InksignError::InvalidInput(_)));
    }
}

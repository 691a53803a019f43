// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document scanner — runs detection and rectification over one photographed
// page.

use image::{DynamicImage, RgbaImage};
use inksign_core::config::ScanConfig;
use inksign_core::error::Result;
use inksign_core::types::Quadrilateral;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::corners::find_corners;
use super::edges::gradient_magnitude;
use super::homography::Homography;
use super::luminance::{ensure_non_empty, smooth};
use super::rectify::{default_output_size, ensure_output_size, rectify};
use crate::image::codec;

/// Where the quadrilateral used for rectification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerSource {
    /// Found by edge detection.
    Detected,
    /// Detection missed; the full image bounds were used.
    Fallback,
    /// Supplied by the user (dragged corners).
    UserSupplied,
}

/// The corners chosen for a page and how they were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub quad: Quadrilateral,
    pub source: CornerSource,
}

/// A rectified page.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub image: RgbaImage,
    pub detection: Detection,
}

impl ScanOutcome {
    /// Encode the rectified page as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        codec::encode_png(&self.image)
    }
}

/// Detects and flattens the document in a single photograph.
///
/// Holds the decoded photo and the detection settings. Every call works on
/// fresh buffers; the scanner itself is never mutated, so one photo can be
/// re-rectified with different corners.
pub struct DocumentScanner {
    image: RgbaImage,
    config: ScanConfig,
}

impl DocumentScanner {
    // -- Construction ---------------------------------------------------------

    /// Decode a photograph (JPEG, PNG, ...) and wrap it.
    #[instrument(skip(data, config), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], config: ScanConfig) -> Result<Self> {
        let image = codec::decode(data)?;
        Self::from_image(image, config)
    }

    /// Wrap an already-decoded RGBA raster. Empty rasters and invalid
    /// detection settings are rejected.
    pub fn from_image(image: RgbaImage, config: ScanConfig) -> Result<Self> {
        ensure_non_empty(image.width(), image.height())?;
        config.validate()?;
        Ok(Self { image, config })
    }

    /// Wrap any decoded image, converting it to RGBA.
    pub fn from_dynamic(image: DynamicImage, config: ScanConfig) -> Result<Self> {
        Self::from_image(image.to_rgba8(), config)
    }

    // -- Accessors ------------------------------------------------------------

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Borrow the photograph.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    // -- Detection ------------------------------------------------------------

    /// Run luminance smoothing, edge magnitude and corner extraction.
    ///
    /// A miss is returned as an error for which
    /// [`is_detection_miss`](inksign_core::InksignError::is_detection_miss)
    /// holds.
    #[instrument(skip(self))]
    pub fn detect_corners(&self) -> Result<Quadrilateral> {
        let smoothed = smooth(&self.image, self.config.blur_radius)?;
        let edges = gradient_magnitude(&smoothed)?;
        let quad = find_corners(&edges, &self.config)?;
        debug!(
            top_left = ?quad.top_left(),
            top_right = ?quad.top_right(),
            bottom_right = ?quad.bottom_right(),
            bottom_left = ?quad.bottom_left(),
            "Document corners detected"
        );
        Ok(quad)
    }

    /// Detect the page, substituting the full image bounds on a miss.
    ///
    /// Only detection misses are absorbed; any other error is returned.
    pub fn corners_or_default(&self) -> Result<Detection> {
        match self.detect_corners() {
            Ok(quad) => Ok(Detection {
                quad,
                source: CornerSource::Detected,
            }),
            Err(err) if err.is_detection_miss() => {
                warn!(reason = %err, "No document detected; using full image bounds");
                let (width, height) = self.dimensions();
                Ok(Detection {
                    quad: Quadrilateral::from_image_bounds(width, height),
                    source: CornerSource::Fallback,
                })
            }
            Err(err) => Err(err),
        }
    }

    // -- Rectification --------------------------------------------------------

    /// Flatten the region inside `quad` onto a rectangle.
    ///
    /// `size` overrides the output dimensions; by default they follow the
    /// quadrilateral's longer edges.
    #[instrument(skip(self))]
    pub fn rectify(&self, quad: &Quadrilateral, size: Option<(u32, u32)>) -> Result<RgbaImage> {
        let (out_w, out_h) = size.unwrap_or_else(|| default_output_size(quad));
        let (src_w, src_h) = self.dimensions();
        ensure_output_size(out_w, out_h, src_w, src_h)?;

        let target = Quadrilateral::from_image_bounds(out_w, out_h);
        let homography = Homography::solve(quad, &target)?;
        rectify(&self.image, &homography, out_w, out_h)
    }

    /// Rectify with corners the user placed by hand, skipping detection.
    pub fn rectify_user_corners(
        &self,
        quad: Quadrilateral,
        size: Option<(u32, u32)>,
    ) -> Result<ScanOutcome> {
        let image = self.rectify(&quad, size)?;
        Ok(ScanOutcome {
            image,
            detection: Detection {
                quad,
                source: CornerSource::UserSupplied,
            },
        })
    }

    // -- Full pipeline --------------------------------------------------------

    /// Detect (or fall back to the image bounds) and rectify.
    #[instrument(skip(self))]
    pub fn scan(&self) -> Result<ScanOutcome> {
        let detection = self.corners_or_default()?;
        let image = self.rectify(&detection.quad, None)?;
        info!(
            width = image.width(),
            height = image.height(),
            source = ?detection.source,
            "Page scanned"
        );
        Ok(ScanOutcome { image, detection })
    }
}

// -- Tests --------------------------------------------------------------------

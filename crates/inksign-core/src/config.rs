// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application and scan-pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InksignError, Result};

/// Upper bound on Douglas-Peucker attempts in one epsilon sweep.
pub const MAX_EPSILON_STEPS: usize = 1_000;

/// Tuning constants for document detection.
///
/// The defaults are the values the detector is calibrated for; changing them
/// changes which documents are found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Gaussian blur radius in pixels applied before gradient computation.
    pub blur_radius: u32,
    /// Edge magnitude (0..=255) a pixel must exceed to count as an edge point.
    pub edge_threshold: u8,
    /// Fewer edge points than this means "no document detected".
    pub min_edge_points: usize,
    /// First Douglas-Peucker tolerance tried when simplifying the hull.
    pub epsilon_start: f64,
    /// Tolerance increment between simplification attempts.
    pub epsilon_step: f64,
    /// Largest tolerance tried before falling back to the farthest points.
    pub epsilon_max: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            blur_radius: 5,
            edge_threshold: 50,
            min_edge_points: 100,
            epsilon_start: 10.0,
            epsilon_step: 10.0,
            epsilon_max: 100.0,
        }
    }
}

impl ScanConfig {
    /// Parse a (possibly partial) JSON document. Missing fields keep defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.blur_radius == 0 {
            return Err(InksignError::Config("blur_radius must be at least 1".into()));
        }
        if !(self.epsilon_start > 0.0 && self.epsilon_step > 0.0) {
            return Err(InksignError::Config(
                "epsilon_start and epsilon_step must be positive".into(),
            ));
        }
        if !(self.epsilon_max >= self.epsilon_start && self.epsilon_max.is_finite()) {
            return Err(InksignError::Config(format!(
                "epsilon_max ({}) must be finite and not below epsilon_start ({})",
                self.epsilon_max, self.epsilon_start
            )));
        }
        let steps = (self.epsilon_max - self.epsilon_start) / self.epsilon_step;
        if steps > MAX_EPSILON_STEPS as f64 {
            return Err(InksignError::Config(format!(
                "epsilon_step {} gives more than {MAX_EPSILON_STEPS} simplification attempts",
                self.epsilon_step
            )));
        }
        Ok(())
    }

    /// Tolerances tried by the simplification sweep, in increasing order:
    /// `epsilon_start + k * epsilon_step` up to `epsilon_max`.
    ///
    /// Always yields at least `epsilon_start` and never more than
    /// `MAX_EPSILON_STEPS + 1` values, even for a config that fails
    /// [`validate`](Self::validate).
    pub fn epsilon_sweep(&self) -> impl Iterator<Item = f64> + '_ {
        let steps = (self.epsilon_max - self.epsilon_start) / self.epsilon_step;
        let steps = if steps.is_finite() && steps > 0.0 {
            (steps.floor() as usize).min(MAX_EPSILON_STEPS)
        } else {
            0
        };
        (0..=steps).map(move |k| self.epsilon_start + k as f64 * self.epsilon_step)
    }
}

/// Persistent host-application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Detection tuning.
    pub scan: ScanConfig,
    /// Paper size for exported signed documents.
    pub default_paper_size: crate::PaperSize,
    /// Resolution at which page rasters are placed in exported PDFs.
    pub export_dpi: u32,
}

impl AppConfig {
    /// Parse a (possibly partial) JSON document. Missing fields keep defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        self.scan.validate()?;
        if self.export_dpi == 0 {
            return Err(InksignError::Config("export_dpi must be positive".into()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            default_paper_size: crate::PaperSize::A4,
            export_dpi: 150,
        }
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Inksign.

use thiserror::Error;

/// Top-level error type for all Inksign operations.
#[derive(Debug, Error)]
pub enum InksignError {
    // -- Scan pipeline --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient edge signal: {found} edge points, need at least {required}")]
    InsufficientEdgeSignal { found: usize, required: usize },

    #[error("no document quadrilateral found: {0}")]
    NoQuadrilateral(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    // -- Collaborators --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl InksignError {
    /// Whether this error is a "no document detected" outcome.
    ///
    /// Detection misses are not fatal: callers substitute the full image
    /// bounds as the document quadrilateral and carry on.
    pub fn is_detection_miss(&self) -> bool {
        matches!(
            self,
            Self::InsufficientEdgeSignal { .. } | Self::NoQuadrilateral(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, InksignError>;

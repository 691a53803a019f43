// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — page detection in a photograph and perspective
// rectification.
//
// photo -> luminance + blur -> edge magnitude -> corners -> homography
//       -> rectified page
//
// A missed detection degrades to the full image bounds rather than failing.

pub mod corners;
pub mod edges;
pub mod homography;
pub mod luminance;
pub mod rectify;
pub mod scanner;

pub use corners::find_corners;
pub use edges::gradient_magnitude;
pub use homography::Homography;
pub use luminance::smooth;
pub use rectify::{default_output_size, rectify};
pub use scanner::{CornerSource, Detection, DocumentScanner, ScanOutcome};

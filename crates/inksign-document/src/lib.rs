// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// inksign-document — Page scanning and signed-document output for Inksign.
//
// Provides the scan geometry pipeline (page detection in a photograph and
// perspective rectification), the image codec, signature compositing, PDF
// export, and integrity digests for exported documents.

pub mod image;
pub mod integrity;
pub mod pdf;
pub mod scan;
pub mod sign;

// Re-export the primary entry points so callers can use `inksign_document::DocumentScanner` etc.
pub use pdf::writer::PdfExporter;
pub use scan::scanner::{CornerSource, Detection, DocumentScanner, ScanOutcome};
pub use sign::composite::{Placement, composite_signature};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — packaging signed page rasters into a printable document.

pub mod writer;

pub use writer::PdfExporter;

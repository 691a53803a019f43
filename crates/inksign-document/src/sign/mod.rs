// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signing — placing a captured signature onto a rectified page.

pub mod composite;

pub use composite::{Placement, composite_signature};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding photographs and encoding finished pages.

pub mod codec;

pub use codec::{decode, encode_jpeg, encode_png};

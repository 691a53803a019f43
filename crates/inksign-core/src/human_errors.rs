// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people signing documents on their phone.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the host UI presents it.

use crate::error::InksignError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing is broken; the app carried on with a sensible default.
    Notice,
    /// User must do something (retake the photo, move a corner).
    ActionRequired,
    /// Cannot be fixed by retrying: unreadable file, bad settings.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same thing again may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert an `InksignError` into a `HumanError`.
pub fn humanize_error(err: &InksignError) -> HumanError {
    match err {
        // -- Scan pipeline --
        InksignError::InvalidInput(detail) => HumanError {
            message: "This picture can't be used.".into(),
            suggestion: format!("Take the photo again or choose a different image. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        InksignError::InsufficientEdgeSignal { .. } | InksignError::NoQuadrilateral(_) => {
            HumanError {
                message: "We couldn't find the edges of the page.".into(),
                suggestion: "We've used the whole photo instead. Drag the corners onto the page edges, or retake the photo against a darker background.".into(),
                retriable: true,
                severity: Severity::Notice,
            }
        }

        InksignError::DegenerateGeometry(_) => HumanError {
            message: "The page corners don't make a proper shape.".into(),
            suggestion: "Move the corners so each one sits on a different corner of the page, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        // -- Collaborators --
        InksignError::ImageError(detail) => HumanError {
            message: "We couldn't read this image.".into(),
            suggestion: format!("Try saving it as a JPEG or PNG photo first. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        InksignError::PdfError(detail) => HumanError {
            message: "We couldn't create the signed document.".into(),
            suggestion: format!("Make sure at least one page is scanned, then try again. ({detail})"),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        InksignError::IntegrityMismatch { .. } => HumanError {
            message: "This document has changed since it was signed.".into(),
            suggestion: "Ask the sender for a fresh copy. Don't rely on this one.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        // -- Configuration / persistence --
        InksignError::Config(detail) => HumanError {
            message: "Some settings aren't valid.".into(),
            suggestion: format!("Reset the scanner settings to their defaults. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        InksignError::Io(io_err) => HumanError {
            message: "We couldn't open or save a file.".into(),
            suggestion: format!("Check there is free space on the device and try again. ({io_err})"),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        InksignError::Serialization(_) => HumanError {
            message: "Some saved data is damaged.".into(),
            suggestion: "Reset the settings to their defaults.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

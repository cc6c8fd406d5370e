// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the scanning UI.
//
// Every technical error is mapped to a plain sentence with a clear suggestion.
// Severity drives how the UI presents it.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Nothing is broken; the user can carry on (e.g. adjust corners by hand).
    Notice,
    /// User must do something (retake photo, fix corners, pick another file).
    ActionRequired,
    /// The operation cannot complete as requested.
    Permanent,
}

/// A human-readable error with plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same thing again can succeed.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError` suitable for display.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::NoDetection => HumanError {
            message: "We couldn't find the document edges.".into(),
            suggestion: "Drag the four corner points onto the document's corners, or retake the photo against a darker background.".into(),
            retriable: true,
            severity: Severity::Notice,
        },

        ScanError::PrimitiveFailure(_) => HumanError {
            message: "Edge detection hit a snag on this image.".into(),
            suggestion: "Place the corners by hand, or try again with a sharper photo.".into(),
            retriable: true,
            severity: Severity::Notice,
        },

        ScanError::DeadlineExceeded { .. } => HumanError {
            message: "Finding the document took too long.".into(),
            suggestion: "Try a smaller photo, or place the corners by hand.".into(),
            retriable: true,
            severity: Severity::Notice,
        },

        ScanError::InvalidInput(detail) => HumanError {
            message: "The corner points don't describe a usable document shape.".into(),
            suggestion: format!("Move the corners so they outline the document. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::ResourceExhausted { .. } => HumanError {
            message: "This image is too large to process.".into(),
            suggestion: "Take the photo at a lower resolution and try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        ScanError::Cancelled => HumanError {
            message: "Live detection stopped.".into(),
            suggestion: "Turn live detection back on to keep scanning.".into(),
            retriable: true,
            severity: Severity::Notice,
        },

        ScanError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        ScanError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "The app doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Permanent,
                }
            }
        }

        ScanError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check the settings file for typos, or delete it to go back to the defaults.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

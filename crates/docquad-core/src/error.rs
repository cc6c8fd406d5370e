// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for docquad.

use thiserror::Error;

use crate::types::ErrorClass;

/// Top-level error type for all docquad operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Detection --
    #[error("no document quadrilateral found")]
    NoDetection,

    #[error("image primitive failed: {0}")]
    PrimitiveFailure(String),

    #[error("detection exceeded its deadline after {elapsed_ms} ms")]
    DeadlineExceeded { elapsed_ms: u128 },

    // -- Caller input --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // -- Resources --
    #[error("buffer of {width}x{height} exceeds the {limit} pixel limit")]
    ResourceExhausted { width: u32, height: u32, limit: u64 },

    #[error("real-time detection was cancelled")]
    Cancelled,

    // -- Still image plumbing --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// How the caller should treat this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoDetection | Self::PrimitiveFailure(_) | Self::DeadlineExceeded { .. } => {
                ErrorClass::Recoverable
            }
            Self::InvalidInput(_) | Self::ImageError(_) | Self::Serialization(_) => {
                ErrorClass::CallerFault
            }
            Self::ResourceExhausted { .. } | Self::Cancelled => ErrorClass::Fatal,
            Self::Io(io_err) => match io_err.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    ErrorClass::CallerFault
                }
                _ => ErrorClass::Fatal,
            },
        }
    }

    /// Shorthand for building an [`ScanError::InvalidInput`].
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidInput(detail.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;

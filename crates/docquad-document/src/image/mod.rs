// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: decode, size limits, PNG/JPEG export.

pub mod processor;

pub use processor::{
    ExportFormat, ExportOptions, decode_image, encode_rgba, ensure_within_limit, load_image,
};

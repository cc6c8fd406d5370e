// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: binarization, boundary detection, and perspective
// rectification.

pub mod binarize;
pub mod detect;
pub mod rectify;

pub use detect::{BoundaryDetector, FrameDetector, ImageprocPrimitives, VisionPrimitives};
pub use rectify::{PerspectiveRectifier, RectifiedImage};

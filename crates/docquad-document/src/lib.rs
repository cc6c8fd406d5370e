// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docquad-document: Document geometry for docquad.
//
// Provides the geometry kernel (corner ordering, target size, homography),
// the boundary detector that finds a page quadrilateral in a photo, the
// perspective rectifier that flattens it, and still-image load/export.

pub mod geometry;
pub mod image;
pub mod scan;

// Re-export the primary types so callers can use `docquad_document::BoundaryDetector` etc.
pub use geometry::{Homography, compute_transform, order_corners, perspective_target_size};
pub use crate::image::{ExportFormat, ExportOptions};
pub use scan::{
    BoundaryDetector, FrameDetector, ImageprocPrimitives, PerspectiveRectifier, RectifiedImage,
    VisionPrimitives,
};

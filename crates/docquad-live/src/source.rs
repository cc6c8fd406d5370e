// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live frame sources.

use std::sync::{Arc, Mutex};

use docquad_core::{Result, ScanError};
use image::RgbaImage;

/// A live video feed as seen by the detection loop.
pub trait FrameSource: Send + 'static {
    /// Native resolution of the current frame, `None` while no frame is
    /// available (camera warming up, stream paused).
    fn resolution(&self) -> Option<(u32, u32)>;

    /// Copy the current frame into `buffer`, which the loop has already
    /// sized to [`resolution`](Self::resolution).
    fn snapshot_into(&mut self, buffer: &mut RgbaImage) -> Result<()>;
}

/// A frame slot a capture thread writes into and the loop reads from.
#[derive(Debug, Clone, Default)]
pub struct SharedFrame {
    inner: Arc<Mutex<Option<RgbaImage>>>,
}

impl SharedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame.
    pub fn publish(&self, frame: RgbaImage) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(frame);
        }
    }

    /// Mark the feed as unavailable.
    pub fn clear(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = None;
        }
    }
}

impl FrameSource for SharedFrame {
    fn resolution(&self) -> Option<(u32, u32)> {
        self.inner.lock().ok()?.as_ref().map(RgbaImage::dimensions)
    }

    fn snapshot_into(&mut self, buffer: &mut RgbaImage) -> Result<()> {
        let slot = self
            .inner
            .lock()
            .map_err(|_| ScanError::PrimitiveFailure("frame slot lock poisoned".into()))?;
        let frame = slot
            .as_ref()
            .ok_or_else(|| ScanError::invalid("no frame available"))?;
        if frame.dimensions() != buffer.dimensions() {
            return Err(ScanError::invalid(format!(
                "frame is {:?} but buffer is {:?}",
                frame.dimensions(),
                buffer.dimensions()
            )));
        }
        buffer.copy_from_slice(frame.as_raw());
        Ok(())
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified pointer events. Mouse and touch input are both funnelled into one
// `PointerEvent` at the UI boundary.

use docquad_core::Point;
use docquad_core::config::EditorConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// The pointer left the editing surface.
    Leave,
    /// The platform aborted the gesture (e.g. a touch was interrupted).
    Cancel,
}

/// Input modality. Coarse pointers get a larger hit radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    #[default]
    Mouse,
    Touch,
}

impl PointerKind {
    /// Hit-test radius in image pixels.
    pub fn hit_radius(self, config: &EditorConfig) -> f64 {
        match self {
            Self::Mouse => config.mouse_hit_radius,
            Self::Touch => config.touch_hit_radius,
        }
    }
}

/// A pointer event in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub position: Point,
    pub phase: PointerPhase,
    pub kind: PointerKind,
}

impl PointerEvent {
    pub fn new(position: Point, phase: PointerPhase, kind: PointerKind) -> Self {
        Self {
            position,
            phase,
            kind,
        }
    }

    pub fn mouse(x: f64, y: f64, phase: PointerPhase) -> Self {
        Self::new(Point::new(x, y), phase, PointerKind::Mouse)
    }

    pub fn touch(x: f64, y: f64, phase: PointerPhase) -> Self {
        Self::new(Point::new(x, y), phase, PointerKind::Touch)
    }
}

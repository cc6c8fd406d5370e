// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner editor: a three-state machine (Idle / Hovering / Dragging) that
// turns pointer events into single-corner updates.

use docquad_core::config::EditorConfig;
use docquad_core::{CornerIndex, CornerSet, Point};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::pointer::{PointerEvent, PointerKind, PointerPhase};
use crate::viewport::Viewport;

/// Where the editor is in a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditorState {
    #[default]
    Idle,
    /// Pointer is near this corner but not pressed.
    Hovering(CornerIndex),
    /// Pointer was pressed on this corner and is moving it.
    Dragging(CornerIndex),
}

/// What a single event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorUpdate {
    /// No visible change (including events dropped for a degenerate scale).
    Ignored,
    /// The state changed; corners are unchanged.
    StateChanged(EditorState),
    /// One corner moved to `position` (image coordinates).
    CornerMoved {
        corner: CornerIndex,
        position: Point,
    },
}

/// One interactive editing session over a [`CornerSet`].
///
/// Only the dragged corner ever changes, and the set is never re-sorted
/// after a manual edit: a user may deliberately drag a corner across the
/// quadrilateral and the role they gave it is kept.
#[derive(Debug, Clone)]
pub struct CornerEditor {
    corners: CornerSet,
    state: EditorState,
    viewport: Viewport,
    config: EditorConfig,
}

impl CornerEditor {
    pub fn new(corners: CornerSet, viewport: Viewport, config: EditorConfig) -> Self {
        Self {
            corners,
            state: EditorState::Idle,
            viewport,
            config,
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn corners(&self) -> &CornerSet {
        &self.corners
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn dragging(&self) -> Option<CornerIndex> {
        match self.state {
            EditorState::Dragging(i) => Some(i),
            _ => None,
        }
    }

    pub fn hovered(&self) -> Option<CornerIndex> {
        match self.state {
            EditorState::Hovering(i) => Some(i),
            _ => None,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Corners converted to display coordinates for overlay drawing.
    pub fn corners_for_display(&self) -> Option<[Point; 4]> {
        let p = self.corners.points();
        Some([
            self.viewport.to_display(p[0])?,
            self.viewport.to_display(p[1])?,
            self.viewport.to_display(p[2])?,
            self.viewport.to_display(p[3])?,
        ])
    }

    // -- Session changes ------------------------------------------------------

    /// Replace the corners (e.g. a fresh detection) and end any gesture.
    pub fn reset_corners(&mut self, corners: CornerSet) {
        self.corners = corners;
        self.state = EditorState::Idle;
    }

    /// The element showing the image was resized.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.viewport.set_display_size(width, height);
    }

    /// A different image was loaded.
    pub fn set_natural_size(&mut self, width: u32, height: u32) {
        self.viewport.set_natural_size(width, height);
    }

    // -- Hit-testing ----------------------------------------------------------

    /// First corner (in canonical order) strictly closer than the modality's
    /// radius to `at`, which is in image coordinates.
    pub fn hit_test(&self, at: Point, kind: PointerKind) -> Option<CornerIndex> {
        let radius = kind.hit_radius(&self.config);
        CornerIndex::ALL
            .into_iter()
            .find(|&i| self.corners[i].distance_to(&at) < radius)
    }

    // -- Event handling -------------------------------------------------------

    pub fn handle(&mut self, event: PointerEvent) -> EditorUpdate {
        match event.phase {
            PointerPhase::Down => self.on_down(event),
            PointerPhase::Move => self.on_move(event),
            PointerPhase::Up => self.on_release(false),
            PointerPhase::Leave | PointerPhase::Cancel => self.on_release(true),
        }
    }

    fn on_down(&mut self, event: PointerEvent) -> EditorUpdate {
        let Some(at) = self.viewport.to_image(event.position) else {
            trace!("Pointer down ignored: degenerate scale");
            return EditorUpdate::Ignored;
        };
        let next = match self.hit_test(at, event.kind) {
            Some(corner) => {
                debug!(?corner, x = at.x, y = at.y, "Corner drag started");
                EditorState::Dragging(corner)
            }
            None => EditorState::Idle,
        };
        self.transition(next)
    }

    fn on_move(&mut self, event: PointerEvent) -> EditorUpdate {
        let Some(at) = self.viewport.to_image(event.position) else {
            trace!("Pointer move ignored: degenerate scale");
            return EditorUpdate::Ignored;
        };
        match self.state {
            EditorState::Dragging(corner) => {
                self.corners = self.corners.with_corner(corner, at);
                EditorUpdate::CornerMoved {
                    corner,
                    position: at,
                }
            }
            EditorState::Idle | EditorState::Hovering(_) => {
                let next = self
                    .hit_test(at, event.kind)
                    .map_or(EditorState::Idle, EditorState::Hovering);
                self.transition(next)
            }
        }
    }

    /// Up ends a drag; leave/cancel also clear hover.
    fn on_release(&mut self, left_surface: bool) -> EditorUpdate {
        match self.state {
            EditorState::Dragging(corner) => {
                debug!(?corner, "Corner drag ended");
                self.transition(EditorState::Idle)
            }
            EditorState::Hovering(_) if left_surface => self.transition(EditorState::Idle),
            _ => EditorUpdate::Ignored,
        }
    }

    fn transition(&mut self, next: EditorState) -> EditorUpdate {
        if next == self.state {
            return EditorUpdate::Ignored;
        }
        self.state = next;
        EditorUpdate::StateChanged(next)
    }
}

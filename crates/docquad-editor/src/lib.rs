// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docquad-editor: Interactive corner editing.
//
// Pointer and touch input arrive in display coordinates; the editor converts
// them to image coordinates, hit-tests the four corners, and moves exactly one
// corner per drag. Rendering stays with the caller.

pub mod editor;
pub mod pointer;
pub mod viewport;

pub use editor::{CornerEditor, EditorState, EditorUpdate};
pub use pointer::{PointerEvent, PointerKind, PointerPhase};
pub use viewport::Viewport;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docquad-live: Real-time document detection.
//
// A tokio task samples a live frame source once per display refresh,
// throttles to at most one detection per interval, runs at most one
// detection at a time on the blocking pool, and republishes only the most
// recent result.

pub mod publisher;
pub mod realtime;
pub mod source;
pub mod throttle;

pub use publisher::{LatestDetection, Published, Subscription};
pub use realtime::{LoopStats, RealtimeDetector, RealtimeHandle};
pub use source::{FrameSource, SharedFrame};
pub use throttle::Throttle;

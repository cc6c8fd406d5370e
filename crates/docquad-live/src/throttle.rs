// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Minimum-interval throttle for the detection loop.

use std::time::{Duration, Instant};

/// Enforces a floor between accepted operations.
///
/// Rejected attempts are simply dropped; nothing is queued or coalesced.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Whether an operation may start at `now`. Does not stamp.
    pub fn ready(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        }
    }

    /// Record that an operation started at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// [`ready`](Self::ready) and, if so, [`mark`](Self::mark).
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.ready(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }
}

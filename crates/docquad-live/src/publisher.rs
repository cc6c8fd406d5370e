// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Last-writer-wins publication of detection results.

use docquad_core::{DetectionResult, Result, ScanError};
use serde::Serialize;
use tokio::sync::watch;

/// A detection outcome stamped with the tick that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Published {
    /// Monotonic id of the detection attempt.
    pub tick: u64,
    /// `None` when the attempt failed or found no document.
    pub detection: Option<DetectionResult>,
}

/// Holds the single most recent detection.
///
/// Consumers never see a queue, only the latest value. A result carrying a
/// tick id at or below the one already published is dropped, so a late
/// completion can never overwrite a newer one.
#[derive(Debug)]
pub struct LatestDetection {
    tx: watch::Sender<Option<Published>>,
}

impl Default for LatestDetection {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestDetection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Publish `detection` for `tick`. Returns `false` when it was stale.
    pub fn publish(&self, tick: u64, detection: Option<DetectionResult>) -> bool {
        self.tx.send_if_modified(|current| match current {
            Some(prev) if prev.tick >= tick => false,
            _ => {
                *current = Some(Published { tick, detection });
                true
            }
        })
    }

    pub fn latest(&self) -> Option<Published> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// A consumer's view of the published results.
#[derive(Debug, Clone)]
pub struct Subscription {
    rx: watch::Receiver<Option<Published>>,
}

impl Subscription {
    /// Latest value without waiting.
    pub fn latest(&self) -> Option<Published> {
        self.rx.borrow().clone()
    }

    /// Wait for a newer result than the last one seen.
    ///
    /// Fails with [`ScanError::Cancelled`] once the publisher is gone (the
    /// loop has stopped).
    pub async fn next(&mut self) -> Result<Published> {
        loop {
            self.rx.changed().await.map_err(|_| ScanError::Cancelled)?;
            if let Some(published) = self.rx.borrow_and_update().clone() {
                return Ok(published);
            }
        }
    }
}

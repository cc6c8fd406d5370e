// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Real-time detection loop.
//
// One tokio task ticks once per display refresh. A tick is dropped when it
// falls inside the throttle floor, when the previous detection is still
// running, or when the source has no frame. Otherwise the frame is copied
// into the loop's reusable buffer, the buffer is moved into a blocking task
// for detection, and it comes back with the result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use docquad_core::config::RealtimeConfig;
use docquad_core::{DetectionResult, Result, ScanError};
use docquad_document::FrameDetector;
use docquad_document::image::ensure_within_limit;
use image::RgbaImage;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::publisher::{LatestDetection, Published, Subscription};
use crate::source::FrameSource;
use crate::throttle::Throttle;

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Counters describing what the loop has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub ticks: u64,
    /// Dropped for falling inside the throttle floor.
    pub throttled: u64,
    /// Dropped because a detection was still running.
    pub busy: u64,
    /// Dropped because the source had no frame.
    pub not_ready: u64,
    /// Detections that completed without error.
    pub detections: u64,
    /// Snapshot or detection failures.
    pub failures: u64,
    /// Completions rejected as older than the published result.
    pub stale_dropped: u64,
    /// Times the snapshot buffer was (re)allocated.
    pub buffer_resizes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    throttled: AtomicU64,
    busy: AtomicU64,
    not_ready: AtomicU64,
    detections: AtomicU64,
    failures: AtomicU64,
    stale_dropped: AtomicU64,
    buffer_resizes: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LoopStats {
        LoopStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            busy: self.busy.load(Ordering::Relaxed),
            not_ready: self.not_ready.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            stale_dropped: self.stale_dropped.load(Ordering::Relaxed),
            buffer_resizes: self.buffer_resizes.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the loop task and its handle.
#[derive(Debug, Default)]
struct Shared {
    detecting: AtomicBool,
    counters: Counters,
}

// ---------------------------------------------------------------------------
// RealtimeDetector
// ---------------------------------------------------------------------------

/// Builder for the detection loop.
#[derive(Debug, Clone, Default)]
pub struct RealtimeDetector {
    config: RealtimeConfig,
}

impl RealtimeDetector {
    pub fn new(config: RealtimeConfig) -> Self {
        Self { config }
    }

    /// Start the loop on the current tokio runtime.
    ///
    /// The loop runs until [`RealtimeHandle::stop`] is called or the handle
    /// is dropped.
    pub fn spawn<S, D>(&self, source: S, detector: Arc<D>) -> RealtimeHandle
    where
        S: FrameSource,
        D: FrameDetector,
    {
        let shutdown = Arc::new(Notify::new());
        let shared = Arc::new(Shared::default());
        let latest = LatestDetection::new();
        let subscription = latest.subscribe();

        let worker = DetectionLoop {
            config: self.config.clone(),
            source,
            detector,
            latest,
            shared: Arc::clone(&shared),
        };
        let task = tokio::spawn(worker.run(Arc::clone(&shutdown)));

        info!(
            min_interval_ms = self.config.min_interval_ms,
            tick_interval_ms = self.config.tick_interval_ms,
            "Real-time detection started"
        );

        RealtimeHandle {
            shutdown,
            task: Some(task),
            shared,
            subscription,
        }
    }
}

// ---------------------------------------------------------------------------
// RealtimeHandle
// ---------------------------------------------------------------------------

/// Owner of a running loop. Dropping it cancels the loop.
#[derive(Debug)]
pub struct RealtimeHandle {
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<LoopStats>>,
    shared: Arc<Shared>,
    subscription: Subscription,
}

impl RealtimeHandle {
    /// Most recently published result.
    pub fn latest(&self) -> Option<Published> {
        self.subscription.latest()
    }

    /// A fresh view of the published results.
    pub fn subscribe(&self) -> Subscription {
        self.subscription.clone()
    }

    /// Whether a detection is running right now.
    pub fn is_detecting(&self) -> bool {
        self.shared.detecting.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> LoopStats {
        self.shared.counters.snapshot()
    }

    /// Stop the loop and wait for it to exit. A detection still running on
    /// the blocking pool is abandoned and its result discarded.
    pub async fn stop(mut self) -> Result<LoopStats> {
        self.shutdown.notify_one();
        let Some(task) = self.task.take() else {
            return Ok(self.stats());
        };
        let stats = task.await.map_err(|err| {
            warn!(error = %err, "Detection loop task failed");
            ScanError::Cancelled
        })?;
        info!(?stats, "Real-time detection stopped");
        Ok(stats)
    }
}

impl Drop for RealtimeHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.shutdown.notify_one();
        }
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

type Completion = std::result::Result<(RgbaImage, Result<DetectionResult>), JoinError>;

/// What one eligible tick did with the buffer.
enum TickOutcome {
    Started(InFlight),
    /// Throttled or no frame; nothing to report.
    Skipped(RgbaImage),
    /// The frame could not be captured; the published result is cleared.
    Failed(RgbaImage),
}

struct InFlight {
    tick: u64,
    handle: JoinHandle<(RgbaImage, Result<DetectionResult>)>,
}

struct DetectionLoop<S, D> {
    config: RealtimeConfig,
    source: S,
    detector: Arc<D>,
    latest: LatestDetection,
    shared: Arc<Shared>,
}

impl<S: FrameSource, D: FrameDetector> DetectionLoop<S, D> {
    #[instrument(skip_all)]
    async fn run(mut self, shutdown: Arc<Notify>) -> LoopStats {
        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut throttle = Throttle::new(self.config.min_interval());

        // `None` while the buffer is out on loan to a running detection.
        let mut buffer: Option<RgbaImage> = Some(RgbaImage::new(0, 0));
        let mut in_flight: Option<InFlight> = None;
        let mut next_tick: u64 = 0;

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    debug!("Detection loop received shutdown signal");
                    break;
                }

                (tick, completion) = join_in_flight(&mut in_flight) => {
                    buffer = Some(self.complete(tick, completion));
                }

                _ = ticker.tick() => {
                    let Some(buf) = buffer.take() else {
                        Counters::bump(&self.shared.counters.ticks);
                        Counters::bump(&self.shared.counters.busy);
                        continue;
                    };
                    match self.try_start(&mut throttle, buf, next_tick + 1) {
                        TickOutcome::Started(started) => {
                            next_tick += 1;
                            in_flight = Some(started);
                        }
                        TickOutcome::Skipped(buf) => buffer = Some(buf),
                        TickOutcome::Failed(buf) => {
                            next_tick += 1;
                            self.latest.publish(next_tick, None);
                            buffer = Some(buf);
                        }
                    }
                }
            }
        }

        self.shared.detecting.store(false, Ordering::Release);
        self.shared.counters.snapshot()
    }

    /// Run one eligible tick. Hands the buffer back when no detection starts.
    fn try_start(&mut self, throttle: &mut Throttle, mut buf: RgbaImage, tick: u64) -> TickOutcome {
        let counters = &self.shared.counters;
        Counters::bump(&counters.ticks);

        let now = Instant::now();
        if !throttle.ready(now) {
            Counters::bump(&counters.throttled);
            return TickOutcome::Skipped(buf);
        }
        let (width, height) = match self.source.resolution() {
            Some((w, h)) if w > 0 && h > 0 => (w, h),
            _ => {
                Counters::bump(&counters.not_ready);
                return TickOutcome::Skipped(buf);
            }
        };
        throttle.mark(now);

        if buf.dimensions() != (width, height) {
            if let Err(err) = ensure_within_limit(width, height, self.config.max_frame_pixels) {
                warn!(tick, width, height, error = %err, "Frame too large to snapshot");
                Counters::bump(&counters.failures);
                return TickOutcome::Failed(buf);
            }
            debug!(tick, width, height, "Resizing snapshot buffer");
            buf = RgbaImage::new(width, height);
            Counters::bump(&counters.buffer_resizes);
        }

        if let Err(err) = self.source.snapshot_into(&mut buf) {
            warn!(tick, error = %err, "Frame snapshot failed");
            Counters::bump(&counters.failures);
            return TickOutcome::Failed(buf);
        }

        self.shared.detecting.store(true, Ordering::Release);
        let detector = Arc::clone(&self.detector);
        let handle = tokio::task::spawn_blocking(move || {
            let result = detector.detect_frame(&buf);
            (buf, result)
        });
        TickOutcome::Started(InFlight { tick, handle })
    }

    /// Publish a finished detection and return the buffer to the loop.
    fn complete(&mut self, tick: u64, completion: Completion) -> RgbaImage {
        self.shared.detecting.store(false, Ordering::Release);
        let counters = &self.shared.counters;

        let (buf, detection) = match completion {
            Ok((buf, Ok(result))) => {
                Counters::bump(&counters.detections);
                debug!(tick, found = result.is_found(), "Detection complete");
                (buf, result.is_found().then_some(result))
            }
            Ok((buf, Err(err))) => {
                Counters::bump(&counters.failures);
                warn!(tick, error = %err, "Detection failed; continuing");
                (buf, None)
            }
            Err(err) => {
                // The buffer went down with the task.
                Counters::bump(&counters.failures);
                warn!(tick, error = %err, "Detection task aborted; continuing");
                (RgbaImage::new(0, 0), None)
            }
        };

        if !self.latest.publish(tick, detection) {
            Counters::bump(&counters.stale_dropped);
            debug!(tick, "Stale detection dropped");
        }
        buf
    }
}

/// Resolve when the running detection finishes; never resolves when idle.
async fn join_in_flight(slot: &mut Option<InFlight>) -> (u64, Completion) {
    match slot {
        Some(in_flight) => {
            let completion = (&mut in_flight.handle).await;
            let tick = in_flight.tick;
            *slot = None;
            (tick, completion)
        }
        None => std::future::pending().await,
    }
}

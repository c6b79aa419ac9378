//! Handpad Frame Loop
//!
//! Runs a [`Session`] against a stream of hand frames:
//!
//! - **Slot:** a producer task hands frames over through a single-slot,
//!   latest-wins channel; frames may be dropped, never queued
//! - **Loop:** the consumer processes at most one frame per cycle and
//!   never waits longer than the frame timeout; on timeout it re-emits the
//!   previous outcome unchanged
//! - **Replay:** recorded JSONL frame streams as a hand pose source
//! - **Writer:** append-only JSONL log of gestures and state changes

pub mod replay;
pub mod slot;
pub mod writer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use handpad_common::clock::{FramePacer, SessionClock};
use handpad_common::error::HandpadResult;
use handpad_gesture_core::{FrameOutcome, Session};
use handpad_hand_model::frame::HandFrame;
use handpad_platform_core::{CursorSink, HandPoseSource, SurfaceLocator};

pub use replay::ReplaySource;
pub use slot::{frame_slot, FramePublisher, FrameSubscriber, SlotRecv};
pub use writer::{SessionEvent, SessionEventWriter, SessionLogHeader};

/// Counters reported when a loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStats {
    pub frames_processed: u64,
    pub frames_dropped: u64,
    /// Cycles that timed out and re-emitted the previous outcome.
    pub stale_cycles: u64,
    pub gestures: u64,
    pub state_changes: u64,
}

/// Consumer side: one session, one surface, one cursor sink.
pub struct FrameLoop<S, K> {
    session: Session,
    surface: S,
    sink: K,
    events: Option<SessionEventWriter>,
    frame_timeout: Duration,
    stop_flag: Arc<AtomicBool>,
    stats: LoopStats,
    last_outcome: Option<FrameOutcome>,
}

impl<S: SurfaceLocator, K: CursorSink> FrameLoop<S, K> {
    pub fn new(session: Session, surface: S, sink: K, frame_timeout: Duration) -> Self {
        Self {
            session,
            surface,
            sink,
            events: None,
            frame_timeout,
            stop_flag: Arc::new(AtomicBool::new(false)),
            stats: LoopStats::default(),
            last_outcome: None,
        }
    }

    /// Log gestures and state changes to `writer`.
    pub fn with_event_writer(mut self, writer: SessionEventWriter) -> Self {
        self.events = Some(writer);
        self
    }

    /// Process one frame synchronously.
    pub fn process(&mut self, frame: &HandFrame) -> HandpadResult<FrameOutcome> {
        let outcome = self
            .session
            .process_frame(frame, &self.surface, &mut self.sink);

        self.stats.frames_processed += 1;
        if outcome.gesture.is_some() {
            self.stats.gestures += 1;
        }
        if outcome.state_changed {
            self.stats.state_changes += 1;
        }
        if let Some(writer) = self.events.as_mut() {
            writer.write_outcome(&outcome)?;
        }

        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Consume frames until the slot closes or the loop is stopped.
    pub async fn run(&mut self, frames: FrameSubscriber) -> HandpadResult<LoopStats> {
        self.run_with(frames, |_, _| {}).await
    }

    /// Like [`FrameLoop::run`], handing every outcome to `observe`.
    ///
    /// The flag passed alongside is `true` when the outcome is a repeat of
    /// the previous one because no frame arrived in time.
    pub async fn run_with<F>(
        &mut self,
        mut frames: FrameSubscriber,
        mut observe: F,
    ) -> HandpadResult<LoopStats>
    where
        F: FnMut(&FrameOutcome, bool),
    {
        tracing::info!(
            timeout_ms = self.frame_timeout.as_millis() as u64,
            "Frame loop started"
        );

        while !self.stop_flag.load(Ordering::Relaxed) {
            match frames.recv(self.frame_timeout).await {
                SlotRecv::Frame(frame) => {
                    let outcome = self.process(&frame)?;
                    observe(&outcome, false);
                }
                SlotRecv::Timeout => {
                    self.stats.stale_cycles += 1;
                    if let Some(previous) = self.last_outcome.as_ref() {
                        observe(previous, true);
                    }
                }
                SlotRecv::Closed => break,
            }
        }

        self.stats.frames_dropped = frames.dropped();
        if let Some(writer) = self.events.as_mut() {
            writer.flush()?;
        }

        tracing::info!(
            frames = self.stats.frames_processed,
            dropped = self.stats.frames_dropped,
            stale = self.stats.stale_cycles,
            gestures = self.stats.gestures,
            "Frame loop stopped"
        );
        Ok(self.stats)
    }

    /// Set the stop flag.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// Get the stop flag for external coordination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn last_outcome(&self) -> Option<&FrameOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Drop all session state, releasing any active hold on the sink.
    pub fn restart(&mut self) {
        self.session.restart(&mut self.sink);
        self.last_outcome = None;
    }
}

/// Producer side: capture frames from `source` at `fps` and publish them
/// until the source finishes, the subscriber goes away, or `stop` is set.
///
/// Source errors are logged and skipped. Returns the number of frames
/// published. Dropping the publisher on return closes the slot.
pub async fn produce<P: HandPoseSource>(
    mut source: P,
    publisher: FramePublisher,
    clock: SessionClock,
    fps: u32,
    stop: Arc<AtomicBool>,
) -> HandpadResult<u64> {
    let mut pacer = FramePacer::new(fps);
    let mut produced = 0u64;
    tracing::info!(source = %source.name(), fps, "Frame producer started");

    while !stop.load(Ordering::Relaxed) {
        if !pacer.should_tick(clock.elapsed_ns()) {
            tokio::time::sleep(Duration::from_millis(1)).await;
            continue;
        }

        match source.capture(&clock) {
            Ok(Some(frame)) => {
                produced += 1;
                if !publisher.publish(frame) {
                    tracing::debug!("Frame subscriber gone");
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Hand source error");
            }
        }
        tokio::task::yield_now().await;
    }

    tracing::info!(
        produced,
        overruns = pacer.overruns(),
        "Frame producer stopped"
    );
    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use handpad_gesture_core::{SessionConfig, SessionState};
    use handpad_hand_model::geometry::Point2D;
    use handpad_hand_model::synthetic::SyntheticHand;
    use handpad_platform_core::{PolygonSurface, RecordingSink, ScreenBounds};

    fn frame_loop() -> FrameLoop<PolygonSurface, RecordingSink> {
        let session = Session::new(
            SessionConfig::default(),
            640,
            480,
            ScreenBounds::new(1920, 1080),
        )
        .unwrap();
        let surface = PolygonSurface::full_frame(640, 480).unwrap().locked();
        FrameLoop::new(
            session,
            surface,
            RecordingSink::new(),
            Duration::from_millis(20),
        )
    }

    fn resting_frames(count: u64) -> Vec<HandFrame> {
        let hand = SyntheticHand::new(640, 480, Point2D::new(320.0, 300.0));
        (0..count)
            .map(|i| HandFrame::with_hand(i * 33_333_333, hand.landmarks()))
            .collect()
    }

    #[test]
    fn test_process_counts_state_changes() {
        let mut frame_loop = frame_loop();
        for frame in resting_frames(10) {
            frame_loop.process(&frame).unwrap();
        }
        let stats = frame_loop.stats();
        assert_eq!(stats.frames_processed, 10);
        assert_eq!(stats.state_changes, 1);
        assert_eq!(frame_loop.session().state(), SessionState::HandAtRest);
    }

    #[tokio::test]
    async fn test_run_drains_slot_and_stops_on_close() {
        let mut frame_loop = frame_loop();
        let (publisher, subscriber) = frame_slot();
        for frame in resting_frames(3) {
            publisher.publish(frame);
        }
        drop(publisher);

        let stats = frame_loop.run(subscriber).await.unwrap();
        assert_eq!(stats.frames_processed, 1);
        assert_eq!(stats.frames_dropped, 2);
    }

    #[tokio::test]
    async fn test_timeout_re_emits_previous_outcome() {
        let mut frame_loop = frame_loop();
        let (publisher, subscriber) = frame_slot();
        publisher.publish(resting_frames(1).remove(0));

        let stop = frame_loop.stop_flag();
        let mut seen = Vec::new();
        let stats = frame_loop
            .run_with(subscriber, |outcome, stale| {
                seen.push((outcome.timestamp_ns, stale));
                if seen.len() == 3 {
                    stop.store(true, Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        assert_eq!(seen, vec![(0, false), (0, true), (0, true)]);
        assert_eq!(stats.stale_cycles, 2);
        drop(publisher);
    }

    #[test]
    fn test_restart_clears_last_outcome() {
        let mut frame_loop = frame_loop();
        frame_loop.process(&resting_frames(1)[0]).unwrap();
        assert!(frame_loop.last_outcome().is_some());
        frame_loop.restart();
        assert!(frame_loop.last_outcome().is_none());
        assert_eq!(frame_loop.session().state(), SessionState::Initializing);
    }
}

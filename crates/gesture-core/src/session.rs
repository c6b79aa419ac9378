//! The per-frame orchestrator.
//!
//! A [`Session`] owns every buffer for one hand on one surface and turns
//! each [`HandFrame`] into at most one gesture dispatch or one cursor move,
//! plus a coarse [`SessionState`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use handpad_common::error::{HandpadError, HandpadResult};
use handpad_hand_model::event::GestureEvent;
use handpad_hand_model::frame::{HandFrame, TimestampNs};
use handpad_hand_model::landmarks::{Finger, Handedness};
use handpad_platform_core::{dispatch_gesture, CursorSink, ScreenBounds, SurfaceLocator};

use crate::cursor::{CursorConfig, CursorController};
use crate::gestures::{GestureClassifier, GestureConfig, GestureInput};
use crate::history::{HistoryBuffer, HistoryConfig};
use crate::smoothing::{FingertipSmoother, LandmarkFilter, SmoothingConfig};
use crate::state::{SessionState, StateConfig, StateVoter};

/// Every tuning knob of the core. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub history: HistoryConfig,
    pub smoothing: SmoothingConfig,
    pub gestures: GestureConfig,
    pub cursor: CursorConfig,
    pub state: StateConfig,
}

impl SessionConfig {
    pub fn validate(&self) -> HandpadResult<()> {
        self.history.validate()?;
        self.smoothing.validate()?;
        self.gestures.validate()?;
        self.cursor.validate()?;
        self.state.validate()
    }

    /// Parse and validate a JSON tuning document.
    pub fn from_json_str(json: &str) -> HandpadResult<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// What one frame produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub timestamp_ns: TimestampNs,
    /// Effective state after this frame.
    pub state: SessionState,
    /// Whether the index fingertip was on a locked surface.
    pub on_surface: bool,
    /// Which hand was seen, when one was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Handedness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gesture: Option<GestureEvent>,
    /// Cursor position emitted this frame.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<(i32, i32)>,
    pub state_changed: bool,
}

/// Why a session dropped its transient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetReason {
    HandLost,
    OffSurface,
    Restart,
}

impl ResetReason {
    fn as_str(self) -> &'static str {
        match self {
            ResetReason::HandLost => "hand lost",
            ResetReason::OffSurface => "hand off surface",
            ResetReason::Restart => "restart",
        }
    }
}

/// Gesture and cursor state for a single hand over a single surface.
pub struct Session {
    config: SessionConfig,
    frame_width: u32,
    frame_height: u32,
    history: HistoryBuffer,
    smoother: FingertipSmoother,
    landmark_filter: Option<LandmarkFilter>,
    classifier: GestureClassifier,
    cursor: CursorController,
    voter: StateVoter,
    frames_processed: u64,
    gestures_fired: u64,
}

impl Session {
    /// Build a session for a camera of `frame_width` x `frame_height`
    /// pixels driving a cursor on `screen`.
    pub fn new(
        config: SessionConfig,
        frame_width: u32,
        frame_height: u32,
        screen: ScreenBounds,
    ) -> HandpadResult<Self> {
        config.validate()?;
        if frame_width == 0 || frame_height == 0 {
            return Err(HandpadError::config(format!(
                "frame size must be non-zero, got {frame_width}x{frame_height}"
            )));
        }
        if screen.width == 0 || screen.height == 0 {
            return Err(HandpadError::config(format!(
                "screen size must be non-zero, got {}x{}",
                screen.width, screen.height
            )));
        }

        let landmark_filter = config
            .smoothing
            .landmarks
            .enabled
            .then(|| LandmarkFilter::new(&config.smoothing.landmarks));

        Ok(Self {
            history: HistoryBuffer::new(config.history.clone()),
            smoother: FingertipSmoother::new(config.smoothing.fingertips),
            landmark_filter,
            classifier: GestureClassifier::new(config.gestures.clone()),
            cursor: CursorController::new(config.cursor.clone(), screen),
            voter: StateVoter::new(config.state.vote_threshold),
            frames_processed: 0,
            gestures_fired: 0,
            frame_width,
            frame_height,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.voter.current()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn cursor(&self) -> &CursorController {
        &self.cursor
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn gestures_fired(&self) -> u64 {
        self.gestures_fired
    }

    /// Process one frame. Never fails: missing or degenerate input resets
    /// transient state instead.
    pub fn process_frame(
        &mut self,
        frame: &HandFrame,
        surface: &dyn SurfaceLocator,
        sink: &mut dyn CursorSink,
    ) -> FrameOutcome {
        self.frames_processed += 1;
        let previous = self.voter.current();

        let Some(raw_hand) = frame.hand.as_ref().filter(|hand| hand.is_finite()) else {
            let gesture = self.reset(ResetReason::HandLost, sink);
            self.voter.reset();
            return self.outcome(frame, previous, None, gesture, None);
        };

        let hand = match self.landmark_filter.as_mut() {
            Some(filter) => filter.apply(raw_hand),
            None => raw_hand.clone(),
        };

        let info = hand.info(self.frame_width, self.frame_height);
        self.history.push_tips(&info.finger_tips);
        let tips = self.smoother.smooth(&info.finger_tips, &self.history);
        let index_tip = tips[Finger::Index];

        let on_surface =
            frame.surface_locked && surface.is_locked() && surface.is_point_inside(index_tip);
        if !on_surface {
            let gesture = self.reset(ResetReason::OffSurface, sink);
            self.voter.force(SessionState::HandOffSurface);
            let seen = Some((info.label, false));
            return self.outcome(frame, previous, seen, gesture, None);
        }

        self.history.update(
            &tips,
            hand.hand_size(),
            hand.center_px(self.frame_width, self.frame_height),
        );
        let movement = self.history.movement_amount();
        let still = movement < self.config.state.stillness_threshold;

        let gesture = self.classifier.evaluate(
            &self.history,
            GestureInput {
                tips: &tips,
                movement,
                still,
                now_secs: frame.timestamp_secs(),
            },
        );

        let mut cursor = None;
        if let Some(event) = gesture {
            self.gestures_fired += 1;
            debug!(gesture = %event, frame = self.frames_processed, "Gesture fired");
            dispatch_gesture(sink, &event);
        } else if !still && surface.center().is_some() {
            cursor = self.cursor.move_cursor(index_tip, sink);
        }

        // Partial windows carry too little history to classify.
        let ready = self.history.is_ready();
        let candidate = ready.then(|| self.candidate_state(movement));
        if let Some(candidate) = candidate {
            self.voter.vote(candidate);
        }
        self.classifier.update_cooldowns();

        trace!(
            frame = self.frames_processed,
            movement,
            still,
            y_travel = self.history.y_travel(Finger::Index),
            size_stable = self.history.is_size_stable(),
            ready,
            candidate = ?candidate,
            hand = %info.label,
            "Frame metrics"
        );

        self.outcome(frame, previous, Some((info.label, true)), gesture, cursor)
    }

    /// Classify this frame's coarse state from the history windows.
    fn candidate_state(&self, movement: f64) -> SessionState {
        let cfg = &self.config.state;
        let size_stable = self.history.is_size_stable();
        if self.history.y_travel(Finger::Index) > cfg.threshold_y && size_stable {
            SessionState::YChangingSizeStable
        } else if movement > cfg.move_threshold * 0.5 {
            SessionState::YChangingSizeChanging
        } else if !size_stable {
            SessionState::YStableSizeChanging
        } else {
            SessionState::HandAtRest
        }
    }

    /// Drop everything and start over as if no hand had been seen.
    ///
    /// An active hold is released on the sink first.
    pub fn restart(&mut self, sink: &mut dyn CursorSink) {
        self.reset(ResetReason::Restart, sink);
        if let Some(filter) = self.landmark_filter.as_mut() {
            filter.reset();
        }
        self.voter.reset();
        info!("Session restarted");
    }

    /// Clear transient state. Returns the release event when a hold was
    /// active.
    fn reset(&mut self, reason: ResetReason, sink: &mut dyn CursorSink) -> Option<GestureEvent> {
        let released = self.classifier.release_hold().then(|| {
            let event = GestureEvent::HoldReleased;
            dispatch_gesture(sink, &event);
            self.gestures_fired += 1;
            event
        });

        let had_state = !self.history.is_empty() || self.cursor.is_anchored();
        if had_state || released.is_some() {
            debug!(
                reason = reason.as_str(),
                hold_released = released.is_some(),
                "Session reset"
            );
        }

        self.history.reset();
        self.smoother.reset();
        self.classifier.reset();
        self.cursor.reset();
        if reason == ResetReason::HandLost {
            if let Some(filter) = self.landmark_filter.as_mut() {
                filter.reset();
            }
        }
        released
    }

    fn outcome(
        &self,
        frame: &HandFrame,
        previous: SessionState,
        seen: Option<(Handedness, bool)>,
        gesture: Option<GestureEvent>,
        cursor: Option<(i32, i32)>,
    ) -> FrameOutcome {
        let state = self.voter.current();
        let state_changed = state != previous;
        if state_changed {
            info!(from = %previous, to = %state, frame = self.frames_processed, "Session state changed");
        }
        FrameOutcome {
            timestamp_ns: frame.timestamp_ns,
            state,
            on_surface: seen.is_some_and(|(_, on_surface)| on_surface),
            hand: seen.map(|(hand, _)| hand),
            gesture,
            cursor,
            state_changed,
        }
    }
}

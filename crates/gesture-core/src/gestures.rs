//! Discrete gesture recognition over the history windows.
//!
//! One [`GestureClassifier::evaluate`] call per on-surface frame returns at
//! most one event. Predicates run in a fixed priority order so compound
//! gestures are never reported as several single ones:
//!
//! hold release, rotate, swipe, scroll, zoom, then (hand still only)
//! two-finger click, double tap, index click, middle click, index hold.
//!
//! Frame-count cooldowns gate the repeating gestures; double tap and hold
//! use frame timestamps instead.

use serde::{Deserialize, Serialize};

use handpad_common::error::HandpadResult;
use handpad_hand_model::event::{
    GestureEvent, HorizontalDirection, ScrollDirection, ZoomDirection,
};
use handpad_hand_model::landmarks::{Finger, FingerTips};

use crate::check;
use crate::history::HistoryBuffer;
use crate::window::Window;

/// Thresholds and cooldowns for every gesture.
///
/// Distances are camera pixels, cooldowns are frames, times are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub click_threshold: f64,
    pub click_cooldown: u32,
    pub middle_click_threshold: f64,
    pub middle_click_cooldown: u32,
    pub two_finger_threshold: f64,
    pub two_finger_cooldown: u32,
    /// Recent frame deltas in which both fingers must tap.
    pub two_finger_window: usize,
    /// Second tap must follow the first within this many seconds...
    pub double_tap_max_interval: f64,
    /// ...but no sooner than this.
    pub double_tap_min_gap: f64,
    pub hold_duration: f64,
    /// Hand-center movement that cancels or releases a hold.
    pub hold_movement: f64,
    pub scroll_threshold: f64,
    pub scroll_cooldown: u32,
    /// Most recent frame deltas that must all move the same way.
    pub scroll_span: usize,
    pub scroll_max_x_separation: f64,
    pub scroll_max_y_separation: f64,
    /// Largest allowed difference between the two fingers' Y travel.
    pub scroll_lockstep_tolerance: f64,
    pub zoom_threshold: f64,
    pub zoom_cooldown: u32,
    pub rotate_threshold: f64,
    pub rotate_cooldown: u32,
    pub rotate_max_y_separation: f64,
    pub swipe_threshold: f64,
    pub swipe_y_tolerance: f64,
    /// Average fingertip movement below which a pending swipe is confirmed.
    pub swipe_slow_speed: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            click_threshold: 8.0,
            click_cooldown: 5,
            middle_click_threshold: 8.0,
            middle_click_cooldown: 5,
            two_finger_threshold: 6.0,
            two_finger_cooldown: 8,
            two_finger_window: 2,
            double_tap_max_interval: 0.6,
            double_tap_min_gap: 0.4,
            hold_duration: 0.3,
            hold_movement: 4.0,
            scroll_threshold: 4.0,
            scroll_cooldown: 5,
            scroll_span: 3,
            scroll_max_x_separation: 40.0,
            scroll_max_y_separation: 12.0,
            scroll_lockstep_tolerance: 15.0,
            zoom_threshold: 15.0,
            zoom_cooldown: 5,
            rotate_threshold: 25.0,
            rotate_cooldown: 5,
            rotate_max_y_separation: 12.0,
            swipe_threshold: 15.0,
            swipe_y_tolerance: 15.0,
            swipe_slow_speed: 3.0,
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> HandpadResult<()> {
        let distances = [
            ("gestures.click_threshold", self.click_threshold),
            ("gestures.middle_click_threshold", self.middle_click_threshold),
            ("gestures.two_finger_threshold", self.two_finger_threshold),
            ("gestures.double_tap_max_interval", self.double_tap_max_interval),
            ("gestures.hold_duration", self.hold_duration),
            ("gestures.hold_movement", self.hold_movement),
            ("gestures.scroll_threshold", self.scroll_threshold),
            ("gestures.scroll_max_x_separation", self.scroll_max_x_separation),
            ("gestures.scroll_max_y_separation", self.scroll_max_y_separation),
            ("gestures.scroll_lockstep_tolerance", self.scroll_lockstep_tolerance),
            ("gestures.zoom_threshold", self.zoom_threshold),
            ("gestures.rotate_threshold", self.rotate_threshold),
            ("gestures.rotate_max_y_separation", self.rotate_max_y_separation),
            ("gestures.swipe_threshold", self.swipe_threshold),
            ("gestures.swipe_y_tolerance", self.swipe_y_tolerance),
            ("gestures.swipe_slow_speed", self.swipe_slow_speed),
        ];
        for (name, value) in distances {
            check::positive(name, value)?;
        }
        check::nonzero("gestures.two_finger_window", self.two_finger_window)?;
        check::nonzero("gestures.scroll_span", self.scroll_span)?;
        if !(self.double_tap_min_gap >= 0.0 && self.double_tap_min_gap < self.double_tap_max_interval)
        {
            return Err(handpad_common::error::HandpadError::config(
                "gestures.double_tap_min_gap must be within [0, double_tap_max_interval)",
            ));
        }
        Ok(())
    }
}

/// Gestures that carry a frame-count cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CooldownKind {
    IndexClick,
    MiddleClick,
    TwoFingerClick,
    Scroll,
    Zoom,
    Rotate,
}

impl CooldownKind {
    pub const ALL: [CooldownKind; 6] = [
        CooldownKind::IndexClick,
        CooldownKind::MiddleClick,
        CooldownKind::TwoFingerClick,
        CooldownKind::Scroll,
        CooldownKind::Zoom,
        CooldownKind::Rotate,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Per-frame input to the classifier beyond the history windows.
#[derive(Debug, Clone, Copy)]
pub struct GestureInput<'a> {
    /// This frame's smoothed fingertips (pixels).
    pub tips: &'a FingerTips,
    /// Hand-center movement across the history window.
    pub movement: f64,
    /// Whether the hand counts as still this frame.
    pub still: bool,
    /// Frame timestamp in seconds.
    pub now_secs: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct HoldLatch {
    armed_at: Option<f64>,
    active: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct SwipeLatch {
    pending: Option<HorizontalDirection>,
    four_finger: bool,
}

/// Stateful gesture recognizer: cooldowns, latches, and consumed-tap markers.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    config: GestureConfig,
    cooldowns: [u32; 6],
    /// Newest index/middle Y sample already examined for taps.
    index_consumed: u64,
    middle_consumed: u64,
    last_tap_secs: Option<f64>,
    hold: HoldLatch,
    swipe: SwipeLatch,
    last_distance: Option<f64>,
    last_tips: Option<FingerTips>,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            cooldowns: [0; 6],
            index_consumed: 0,
            middle_consumed: 0,
            last_tap_secs: None,
            hold: HoldLatch::default(),
            swipe: SwipeLatch::default(),
            last_distance: None,
            last_tips: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Frames left before a gesture may fire again.
    pub fn cooldown(&self, kind: CooldownKind) -> u32 {
        self.cooldowns[kind.slot()]
    }

    /// A press-and-hold is in progress (mouse button down).
    pub fn is_holding(&self) -> bool {
        self.hold.active
    }

    /// A swipe has passed its fast phase and awaits confirmation.
    pub fn swipe_pending(&self) -> Option<HorizontalDirection> {
        self.swipe.pending
    }

    /// Evaluate every predicate for one on-surface frame.
    pub fn evaluate(
        &mut self,
        history: &HistoryBuffer,
        input: GestureInput<'_>,
    ) -> Option<GestureEvent> {
        let distance = input.tips[Finger::Index].distance_to(&input.tips[Finger::Middle]);
        let distance_change = self.last_distance.map(|last| distance - last);
        self.last_distance = Some(distance);

        let event = self.detect(history, &input, distance_change);
        self.last_tips = Some(*input.tips);
        event
    }

    fn detect(
        &mut self,
        history: &HistoryBuffer,
        input: &GestureInput<'_>,
        distance_change: Option<f64>,
    ) -> Option<GestureEvent> {
        if let Some(event) = self.check_hold_release(input.movement) {
            return Some(event);
        }
        if let Some(direction) = self.check_rotate(history, input.tips) {
            return Some(GestureEvent::Rotate { direction });
        }
        if let Some(event) = self.check_swipe(history, input.tips) {
            return Some(event);
        }
        if let Some(direction) = self.check_scroll(history, input.tips) {
            return Some(GestureEvent::Scroll { direction });
        }
        if let Some(direction) = self.check_zoom(distance_change) {
            return Some(GestureEvent::Zoom { direction });
        }

        if !input.still {
            // Finger motion while the hand travels is not a tap.
            self.consume_taps(history);
            return None;
        }

        let size_stable = history.is_size_stable();
        if let Some(event) = self.check_taps(history, size_stable, input.now_secs) {
            return Some(event);
        }
        self.check_hold(input.movement, input.now_secs)
    }

    fn check_taps(
        &mut self,
        history: &HistoryBuffer,
        size_stable: bool,
        now: f64,
    ) -> Option<GestureEvent> {
        if self.two_finger_tap(history) {
            self.consume_taps(history);
            if size_stable && self.ready(CooldownKind::TwoFingerClick) {
                self.arm(CooldownKind::TwoFingerClick);
                return Some(GestureEvent::TwoFingerClick);
            }
            return None;
        }

        if self.tap_pending(history, Finger::Index, self.config.click_threshold) {
            self.index_consumed = pushed(history, Finger::Index);
            if !size_stable {
                return None;
            }

            if let Some(last) = self.last_tap_secs {
                let gap = now - last;
                if gap > self.config.double_tap_min_gap && gap < self.config.double_tap_max_interval
                {
                    self.last_tap_secs = None;
                    self.hold.armed_at = None;
                    return Some(GestureEvent::DoubleTap);
                }
            }
            self.last_tap_secs = Some(now);

            if self.ready(CooldownKind::IndexClick) {
                self.arm(CooldownKind::IndexClick);
                if !self.hold.active {
                    self.hold.armed_at = Some(now);
                }
                return Some(GestureEvent::IndexClick);
            }
            return None;
        }

        if self.tap_pending(history, Finger::Middle, self.config.middle_click_threshold) {
            self.middle_consumed = pushed(history, Finger::Middle);
            if size_stable && self.ready(CooldownKind::MiddleClick) {
                self.arm(CooldownKind::MiddleClick);
                return Some(GestureEvent::MiddleClick);
            }
        }
        None
    }

    /// Unconsumed up-then-down (or down-then-up) excursion on one finger.
    fn tap_pending(&self, history: &HistoryBuffer, finger: Finger, threshold: f64) -> bool {
        let consumed = match finger {
            Finger::Middle => self.middle_consumed,
            _ => self.index_consumed,
        };
        history
            .y_window(finger)
            .map(|w| has_excursion(w.deltas_since(consumed), threshold))
            .unwrap_or(false)
    }

    fn two_finger_tap(&self, history: &HistoryBuffer) -> bool {
        let (Some(index), Some(middle)) = (
            history.y_window(Finger::Index),
            history.y_window(Finger::Middle),
        ) else {
            return false;
        };
        let window = self.config.two_finger_window;
        let threshold = self.config.two_finger_threshold;
        has_excursion(index.recent_deltas_since(window, self.index_consumed), threshold)
            && has_excursion(
                middle.recent_deltas_since(window, self.middle_consumed),
                threshold,
            )
    }

    fn consume_taps(&mut self, history: &HistoryBuffer) {
        self.index_consumed = pushed(history, Finger::Index);
        self.middle_consumed = pushed(history, Finger::Middle);
    }

    fn check_hold(&mut self, movement: f64, now: f64) -> Option<GestureEvent> {
        let armed_at = self.hold.armed_at?;
        if self.hold.active {
            return None;
        }
        if now - armed_at >= self.config.hold_duration && movement < self.config.hold_movement {
            self.hold.armed_at = None;
            self.hold.active = true;
            return Some(GestureEvent::HoldStarted);
        }
        None
    }

    fn check_hold_release(&mut self, movement: f64) -> Option<GestureEvent> {
        if movement < self.config.hold_movement {
            return None;
        }
        self.hold.armed_at = None;
        if self.hold.active {
            self.hold.active = false;
            return Some(GestureEvent::HoldReleased);
        }
        None
    }

    /// End an active hold outside of `evaluate` (hand left or was lost).
    ///
    /// Returns whether a hold was active.
    pub fn release_hold(&mut self) -> bool {
        let was_active = self.hold.active;
        self.hold = HoldLatch::default();
        was_active
    }

    fn check_rotate(
        &mut self,
        history: &HistoryBuffer,
        tips: &FingerTips,
    ) -> Option<HorizontalDirection> {
        if !self.ready(CooldownKind::Rotate) {
            return None;
        }
        let index = history.x_window(Finger::Index)?;
        let middle = history.x_window(Finger::Middle)?;
        if index.len() < 2 || middle.len() < 2 {
            return None;
        }

        let y_separation = (tips[Finger::Index].y - tips[Finger::Middle].y).abs();
        if !(y_separation < self.config.rotate_max_y_separation) {
            return None;
        }

        let index_dx = index.net_change();
        let middle_dx = middle.net_change();
        let threshold = self.config.rotate_threshold;
        if index_dx.abs() > threshold && middle_dx.abs() > threshold && index_dx * middle_dx > 0.0 {
            self.arm(CooldownKind::Rotate);
            return Some(HorizontalDirection::from_dx(index_dx));
        }
        None
    }

    fn check_swipe(&mut self, history: &HistoryBuffer, tips: &FingerTips) -> Option<GestureEvent> {
        let reference = self.last_tips?;
        let moving_slowly = history.average_finger_movement() < self.config.swipe_slow_speed;

        let fingers = [Finger::Index, Finger::Middle, Finger::Ring];
        let dx: Vec<f64> = fingers.iter().map(|f| tips[*f].x - reference[*f].x).collect();
        let dy: Vec<f64> = fingers.iter().map(|f| tips[*f].y - reference[*f].y).collect();

        let threshold = self.config.swipe_threshold;
        let horizontal = dx.iter().all(|d| d.abs() > threshold)
            && (dx.iter().all(|d| *d > 0.0) || dx.iter().all(|d| *d < 0.0));
        let vertical_stable = dy.iter().all(|d| d.abs() < self.config.swipe_y_tolerance);

        if horizontal && vertical_stable && !moving_slowly {
            self.swipe.pending = Some(HorizontalDirection::from_dx(dx[0]));
            let pinky_dx = tips[Finger::Pinky].x - reference[Finger::Pinky].x;
            if pinky_dx.abs() > threshold {
                self.swipe.four_finger = true;
            }
            return None;
        }

        if moving_slowly {
            if let Some(direction) = self.swipe.pending.take() {
                let four_finger = std::mem::take(&mut self.swipe.four_finger);
                return Some(GestureEvent::Swipe {
                    direction,
                    four_finger,
                });
            }
        }
        None
    }

    fn check_scroll(
        &mut self,
        history: &HistoryBuffer,
        tips: &FingerTips,
    ) -> Option<ScrollDirection> {
        if !self.ready(CooldownKind::Scroll) {
            return None;
        }
        let x_separation = (tips[Finger::Index].x - tips[Finger::Middle].x).abs();
        let y_separation = (tips[Finger::Index].y - tips[Finger::Middle].y).abs();
        if !(x_separation < self.config.scroll_max_x_separation
            && y_separation < self.config.scroll_max_y_separation)
        {
            return None;
        }

        let span = self.config.scroll_span;
        let index_dy = sustained_travel(history.y_window(Finger::Index)?, span)?;
        let middle_dy = sustained_travel(history.y_window(Finger::Middle)?, span)?;
        let threshold = self.config.scroll_threshold;
        if index_dy.abs() > threshold
            && middle_dy.abs() > threshold
            && index_dy * middle_dy > 0.0
            && (index_dy - middle_dy).abs() < self.config.scroll_lockstep_tolerance
        {
            self.arm(CooldownKind::Scroll);
            // Fingers sliding up the image scroll the content down.
            return Some(if index_dy < 0.0 {
                ScrollDirection::Down
            } else {
                ScrollDirection::Up
            });
        }
        None
    }

    fn check_zoom(&mut self, distance_change: Option<f64>) -> Option<ZoomDirection> {
        let change = distance_change?;
        if !self.ready(CooldownKind::Zoom) || !(change.abs() > self.config.zoom_threshold) {
            return None;
        }
        self.arm(CooldownKind::Zoom);
        Some(if change > 0.0 {
            ZoomDirection::Out
        } else {
            ZoomDirection::In
        })
    }

    fn ready(&self, kind: CooldownKind) -> bool {
        self.cooldowns[kind.slot()] == 0
    }

    fn arm(&mut self, kind: CooldownKind) {
        self.cooldowns[kind.slot()] = match kind {
            CooldownKind::IndexClick => self.config.click_cooldown,
            CooldownKind::MiddleClick => self.config.middle_click_cooldown,
            CooldownKind::TwoFingerClick => self.config.two_finger_cooldown,
            CooldownKind::Scroll => self.config.scroll_cooldown,
            CooldownKind::Zoom => self.config.zoom_cooldown,
            CooldownKind::Rotate => self.config.rotate_cooldown,
        };
    }

    /// Tick every cooldown down by one frame.
    pub fn update_cooldowns(&mut self) {
        for counter in &mut self.cooldowns {
            *counter = counter.saturating_sub(1);
        }
    }

    /// Clear latches, markers, and cooldowns.
    pub fn reset(&mut self) {
        self.cooldowns = [0; 6];
        self.index_consumed = 0;
        self.middle_consumed = 0;
        self.last_tap_secs = None;
        self.hold = HoldLatch::default();
        self.swipe = SwipeLatch::default();
        self.last_distance = None;
        self.last_tips = None;
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

/// Net travel over the last `span` deltas when every one of them moved
/// the same way. `None` while the window is too short or the run is broken.
fn sustained_travel(window: &Window<f64>, span: usize) -> Option<f64> {
    if window.len() < span + 1 {
        return None;
    }
    let deltas: Vec<f64> = window.recent_deltas_since(span, 0).collect();
    let rising = deltas.iter().all(|d| *d > 0.0);
    let falling = deltas.iter().all(|d| *d < 0.0);
    if rising || falling {
        Some(deltas.iter().sum())
    } else {
        None
    }
}

fn pushed(history: &HistoryBuffer, finger: Finger) -> u64 {
    history.y_window(finger).map(|w| w.pushed()).unwrap_or(0)
}

/// A leg beyond `threshold` in one direction followed by a leg beyond it
/// in the other. A monotonic run never qualifies, however long.
fn has_excursion(deltas: impl Iterator<Item = f64>, threshold: f64) -> bool {
    let mut seen_up = false;
    let mut seen_down = false;
    for delta in deltas.filter(|d| d.is_finite()) {
        if delta > threshold {
            if seen_down {
                return true;
            }
            seen_up = true;
        } else if delta < -threshold {
            if seen_up {
                return true;
            }
            seen_down = true;
        }
    }
    false
}

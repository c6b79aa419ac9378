//! Fingertip-to-cursor mapping.
//!
//! Relative mode: each call turns the fingertip's frame delta into a screen
//! displacement with dead-zone, momentum, pointer acceleration, weighted
//! target averaging, and an adaptive low-pass, then clamps to the screen.

use serde::{Deserialize, Serialize};
use tracing::trace;

use handpad_common::error::HandpadResult;
use handpad_hand_model::geometry::Point2D;
use handpad_platform_core::{CursorSink, ScreenBounds};

use crate::check;
use crate::window::Window;

/// Cursor response tuning. Distances are camera pixels per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    pub sensitivity_x: f64,
    pub sensitivity_y: f64,
    /// Per-axis dead zone for raw fingertip deltas.
    pub jitter_threshold: f64,
    /// Speeds below this are treated as tremor: damped and heavily smoothed.
    pub min_speed: f64,
    pub max_speed: f64,
    /// Fraction of `max_speed` at which the acceleration curve saturates.
    pub speed_scale: f64,
    /// Exponent applied to the saturated speed factor.
    pub acceleration: f64,
    pub base_gain: f64,
    pub boost: f64,
    /// Fraction of `max_speed` above which `boost` applies.
    pub boost_cutoff: f64,
    /// Weight of the previous frame's delta.
    pub momentum: f64,
    /// Recent screen targets averaged together.
    pub history_len: usize,
    /// Ratio between consecutive averaging weights, newest heaviest.
    pub weight_base: f64,
    pub min_smoothing: f64,
    pub max_smoothing: f64,
    /// Smoothing multiplier for fast motion.
    pub fast_smoothing_scale: f64,
    /// Smoothing multiplier on the axis carrying most of the motion.
    pub dominant_axis_factor: f64,
    /// Moving the fingertip up the camera image moves the cursor down.
    pub invert_y: bool,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            sensitivity_x: 4.5,
            sensitivity_y: 6.0,
            jitter_threshold: 0.8,
            min_speed: 2.0,
            max_speed: 120.0,
            speed_scale: 0.8,
            acceleration: 1.015,
            base_gain: 0.8,
            boost: 1.2,
            boost_cutoff: 0.3,
            momentum: 0.25,
            history_len: 6,
            weight_base: 1.8,
            min_smoothing: 0.12,
            max_smoothing: 0.25,
            fast_smoothing_scale: 0.7,
            dominant_axis_factor: 0.85,
            invert_y: true,
        }
    }
}

impl CursorConfig {
    pub fn validate(&self) -> HandpadResult<()> {
        check::positive("cursor.sensitivity_x", self.sensitivity_x)?;
        check::positive("cursor.sensitivity_y", self.sensitivity_y)?;
        check::positive("cursor.jitter_threshold", self.jitter_threshold)?;
        check::positive("cursor.min_speed", self.min_speed)?;
        check::positive("cursor.max_speed", self.max_speed)?;
        check::positive("cursor.speed_scale", self.speed_scale)?;
        check::positive("cursor.acceleration", self.acceleration)?;
        check::positive("cursor.base_gain", self.base_gain)?;
        check::positive("cursor.boost", self.boost)?;
        check::unit("cursor.boost_cutoff", self.boost_cutoff)?;
        check::unit("cursor.momentum", self.momentum)?;
        check::nonzero("cursor.history_len", self.history_len)?;
        check::positive("cursor.weight_base", self.weight_base)?;
        check::unit("cursor.min_smoothing", self.min_smoothing)?;
        check::unit("cursor.max_smoothing", self.max_smoothing)?;
        check::unit("cursor.fast_smoothing_scale", self.fast_smoothing_scale)?;
        check::unit("cursor.dominant_axis_factor", self.dominant_axis_factor)?;
        if self.min_smoothing > self.max_smoothing {
            return Err(handpad_common::error::HandpadError::config(
                "cursor.min_smoothing must not exceed cursor.max_smoothing",
            ));
        }
        Ok(())
    }
}

/// Relative-mode cursor controller.
///
/// The anchor (last fingertip, screen position, smoothed position, last
/// delta, recent targets) is cleared by [`CursorController::reset`]; the
/// next call after a reset only re-acquires the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorController {
    config: CursorConfig,
    screen: ScreenBounds,
    last_tip: Option<Point2D>,
    last_delta: Point2D,
    position: Option<Point2D>,
    smoothed: Option<Point2D>,
    targets: Window<Point2D>,
}

impl CursorController {
    pub fn new(config: CursorConfig, screen: ScreenBounds) -> Self {
        let targets = Window::new(config.history_len);
        Self {
            config,
            screen,
            last_tip: None,
            last_delta: Point2D::ORIGIN,
            position: None,
            smoothed: None,
            targets,
        }
    }

    pub fn config(&self) -> &CursorConfig {
        &self.config
    }

    pub fn screen(&self) -> ScreenBounds {
        self.screen
    }

    /// Last emitted (or acquired) screen position.
    pub fn position(&self) -> Option<Point2D> {
        self.position
    }

    pub fn is_anchored(&self) -> bool {
        self.last_tip.is_some()
    }

    /// Feed this frame's fingertip (camera pixels).
    ///
    /// Returns the position moved to, or `None` when the call only
    /// acquired the anchor or the fingertip was not finite.
    pub fn move_cursor(&mut self, tip: Point2D, sink: &mut dyn CursorSink) -> Option<(i32, i32)> {
        if !tip.is_finite() {
            return None;
        }

        let Some(last_tip) = self.last_tip else {
            self.acquire(tip, sink);
            return None;
        };
        let position = self.position.unwrap_or_else(|| self.start_position(&*sink));
        let smoothed = self.smoothed.unwrap_or(position);
        let cfg = &self.config;

        let mut raw = tip.delta_from(&last_tip);
        if raw.x.abs() < cfg.jitter_threshold && raw.y.abs() < cfg.jitter_threshold {
            raw = Point2D::ORIGIN;
        }

        let m = cfg.momentum;
        let mut delta = Point2D::new(
            raw.x * (1.0 - m) + self.last_delta.x * m,
            raw.y * (1.0 - m) + self.last_delta.y * m,
        );
        let speed = delta.magnitude();
        let slow = speed < cfg.min_speed;
        if slow {
            delta = Point2D::new(delta.x * 0.5, delta.y * 0.5);
        }

        let speed_factor = (speed / (cfg.max_speed * cfg.speed_scale))
            .tanh()
            .powf(cfg.acceleration);
        let fast = speed > cfg.max_speed * cfg.boost_cutoff;
        let boost = if fast { cfg.boost } else { 1.0 };
        let gain = (cfg.base_gain + speed_factor) * boost;
        let y_sign = if cfg.invert_y { -1.0 } else { 1.0 };

        let candidate = Point2D::new(
            position.x + delta.x * cfg.sensitivity_x * gain,
            position.y + delta.y * cfg.sensitivity_y * gain * y_sign,
        );
        self.targets.push(candidate);
        let target = weighted_average(&self.targets, cfg.weight_base).unwrap_or(candidate);

        let mut smoothing = if slow {
            cfg.max_smoothing
        } else if fast {
            cfg.min_smoothing * cfg.fast_smoothing_scale
        } else {
            cfg.min_smoothing + (1.0 - speed_factor) * (cfg.max_smoothing - cfg.min_smoothing)
        };
        if !smoothing.is_finite() {
            smoothing = cfg.max_smoothing;
        }
        let (sx, sy) = if delta.x.abs() >= delta.y.abs() {
            (smoothing * cfg.dominant_axis_factor, smoothing)
        } else {
            (smoothing, smoothing * cfg.dominant_axis_factor)
        };

        let blended_x = target.x * (1.0 - sx) + smoothed.x * sx;
        let blended_y = target.y * (1.0 - sy) + smoothed.y * sy;
        let (x, y) = self.screen.clamp(blended_x, blended_y);
        let next = Point2D::new(x, y);

        trace!(
            speed,
            speed_factor,
            gain,
            x = next.x,
            y = next.y,
            "Cursor step"
        );

        self.last_tip = Some(tip);
        self.last_delta = if delta.is_finite() {
            delta
        } else {
            Point2D::ORIGIN
        };
        self.position = Some(next);
        self.smoothed = Some(next);

        let emitted = (next.x.round() as i32, next.y.round() as i32);
        sink.move_to(emitted.0, emitted.1);
        Some(emitted)
    }

    fn acquire(&mut self, tip: Point2D, sink: &dyn CursorSink) {
        let start = self.position.unwrap_or_else(|| self.start_position(&*sink));
        self.last_tip = Some(tip);
        self.last_delta = Point2D::ORIGIN;
        self.position = Some(start);
        self.smoothed = Some(start);
        self.targets.clear();
        trace!(x = start.x, y = start.y, "Cursor anchor acquired");
    }

    fn start_position(&self, sink: &dyn CursorSink) -> Point2D {
        let (x, y) = match sink.position() {
            Some((x, y)) => self.screen.clamp(x as f64, y as f64),
            None => self.screen.center(),
        };
        Point2D::new(x, y)
    }

    /// Drop the anchor. Calling it again changes nothing.
    pub fn reset(&mut self) {
        self.last_tip = None;
        self.last_delta = Point2D::ORIGIN;
        self.position = None;
        self.smoothed = None;
        self.targets.clear();
    }
}

/// Weighted mean with weights `base^i`, oldest sample at `i = 0`.
fn weighted_average(targets: &Window<Point2D>, base: f64) -> Option<Point2D> {
    let mut weight = 1.0;
    let mut total = 0.0;
    let mut x = 0.0;
    let mut y = 0.0;
    for point in targets.iter() {
        x += point.x * weight;
        y += point.y * weight;
        total += weight;
        weight *= base;
    }
    if total > 0.0 && total.is_finite() {
        Some(Point2D::new(x / total, y / total))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handpad_platform_core::RecordingSink;
    use proptest::prelude::*;

    fn controller() -> CursorController {
        CursorController::new(CursorConfig::default(), ScreenBounds::new(1920, 1080))
    }

    #[test]
    fn test_first_call_only_anchors() {
        let mut cursor = controller();
        let mut sink = RecordingSink::new();
        assert_eq!(cursor.move_cursor(Point2D::new(100.0, 100.0), &mut sink), None);
        assert!(sink.commands().is_empty());
        assert!(cursor.is_anchored());
        assert_eq!(cursor.position(), Some(Point2D::new(960.0, 540.0)));
    }

    #[test]
    fn test_anchor_uses_sink_position() {
        let mut cursor = controller();
        let mut sink = RecordingSink::with_position(100, 200);
        cursor.move_cursor(Point2D::new(10.0, 10.0), &mut sink);
        assert_eq!(cursor.position(), Some(Point2D::new(100.0, 200.0)));
    }

    #[test]
    fn test_rightward_motion_moves_right() {
        let mut cursor = controller();
        let mut sink = RecordingSink::new();
        let mut x = 100.0;
        cursor.move_cursor(Point2D::new(x, 100.0), &mut sink);
        for _ in 0..5 {
            x += 10.0;
            cursor.move_cursor(Point2D::new(x, 100.0), &mut sink);
        }
        let moves: Vec<(i32, i32)> = sink.moves().collect();
        assert_eq!(moves.len(), 5);
        assert!(moves.windows(2).all(|w| w[1].0 >= w[0].0));
        assert!(moves[4].0 > 960);
        assert_eq!(moves[4].1, 540);
    }

    #[test]
    fn test_upward_fingertip_moves_cursor_down_when_inverted() {
        let mut cursor = controller();
        let mut sink = RecordingSink::new();
        cursor.move_cursor(Point2D::new(100.0, 300.0), &mut sink);
        let moved = cursor.move_cursor(Point2D::new(100.0, 280.0), &mut sink);
        let (_, y) = moved.unwrap();
        assert!(y > 540);
    }

    #[test]
    fn test_dead_zone_suppresses_jitter() {
        let mut cursor = controller();
        let mut sink = RecordingSink::new();
        cursor.move_cursor(Point2D::new(100.0, 100.0), &mut sink);
        for i in 0..10 {
            let wobble = if i % 2 == 0 { 0.3 } else { -0.3 };
            cursor.move_cursor(Point2D::new(100.0 + wobble, 100.0 - wobble), &mut sink);
        }
        assert!(sink.moves().all(|p| p == (960, 540)));
    }

    #[test]
    fn test_non_finite_tip_is_ignored() {
        let mut cursor = controller();
        let mut sink = RecordingSink::new();
        assert_eq!(cursor.move_cursor(Point2D::new(f64::NAN, 1.0), &mut sink), None);
        assert!(!cursor.is_anchored());
    }

    #[test]
    fn test_reset_is_idempotent_and_reacquires() {
        let mut cursor = controller();
        let mut sink = RecordingSink::new();
        cursor.move_cursor(Point2D::new(100.0, 100.0), &mut sink);
        cursor.move_cursor(Point2D::new(140.0, 100.0), &mut sink);

        cursor.reset();
        let once = cursor.clone();
        cursor.reset();
        assert_eq!(cursor, once);
        assert!(!cursor.is_anchored());

        sink.clear();
        assert_eq!(cursor.move_cursor(Point2D::new(500.0, 500.0), &mut sink), None);
        assert!(sink.commands().is_empty());
    }

    #[test]
    fn test_weighted_average_favors_newest() {
        let mut window = Window::new(3);
        window.push(Point2D::new(0.0, 0.0));
        window.push(Point2D::new(10.0, 0.0));
        let avg = weighted_average(&window, 2.0).unwrap();
        // weights 1 and 2
        assert!((avg.x - 20.0 / 3.0).abs() < 1e-12);
        assert!(weighted_average(&Window::new(3), 2.0).is_none());
    }

    #[test]
    fn test_config_validation() {
        assert!(CursorConfig::default().validate().is_ok());
        let bad = CursorConfig {
            min_smoothing: 0.5,
            max_smoothing: 0.2,
            ..CursorConfig::default()
        };
        assert!(bad.validate().is_err());
        let zero = CursorConfig {
            max_speed: 0.0,
            ..CursorConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    proptest! {
        #[test]
        fn test_cursor_stays_on_screen(
            tips in proptest::collection::vec((-1.0e4f64..1.0e4, -1.0e4f64..1.0e4), 1..64),
            width in 1u32..4000,
            height in 1u32..3000,
        ) {
            let screen = ScreenBounds::new(width, height);
            let mut cursor = CursorController::new(CursorConfig::default(), screen);
            let mut sink = RecordingSink::new();
            for (x, y) in tips {
                cursor.move_cursor(Point2D::new(x, y), &mut sink);
            }
            for (x, y) in sink.moves() {
                prop_assert!(screen.contains(x, y), "({}, {}) outside {:?}", x, y, screen);
            }
        }
    }
}

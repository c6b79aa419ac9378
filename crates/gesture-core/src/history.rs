//! Rolling per-frame history of an on-surface hand.
//!
//! All windows advance together: one [`HistoryBuffer::update`] per
//! processed on-surface frame. Queries never fail; with too few samples
//! they report "no movement" and "stable".

use std::cell::Cell;

use serde::{Deserialize, Serialize};

use handpad_common::error::{HandpadError, HandpadResult};
use handpad_hand_model::geometry::Point2D;
use handpad_hand_model::landmarks::{Finger, FingerTips};

use crate::check;
use crate::window::Window;

/// Fingers whose Y position is tracked.
pub const Y_TRACKED: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

/// Fingers whose X position is tracked.
pub const X_TRACKED: [Finger; 2] = [Finger::Index, Finger::Middle];

/// Window sizes and thresholds for [`HistoryBuffer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Samples kept per finger coordinate.
    pub finger_capacity: usize,
    pub size_capacity: usize,
    pub center_capacity: usize,
    /// Raw fingertip samples kept for smoothing and finger movement.
    pub tip_capacity: usize,
    /// Weight of the previous smoothed hand size in the one-pole filter.
    pub size_smoothing: f64,
    /// Mean relative size change at or below which size counts as stable.
    pub size_stability_threshold: f64,
    /// Most recent size samples looked at by the stability check.
    pub size_stability_samples: usize,
    pub size_change_log_capacity: usize,
    /// Relative size change worth recording in the change log.
    pub significant_size_change: f64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            finger_capacity: 8,
            size_capacity: 6,
            center_capacity: 6,
            tip_capacity: 3,
            size_smoothing: 0.7,
            size_stability_threshold: 0.04,
            size_stability_samples: 4,
            size_change_log_capacity: 50,
            significant_size_change: 0.008,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> HandpadResult<()> {
        check::nonzero("history.finger_capacity", self.finger_capacity)?;
        check::nonzero("history.size_capacity", self.size_capacity)?;
        check::nonzero("history.center_capacity", self.center_capacity)?;
        check::nonzero("history.tip_capacity", self.tip_capacity)?;
        check::nonzero("history.size_change_log_capacity", self.size_change_log_capacity)?;
        if self.size_stability_samples < 2 {
            return Err(HandpadError::config(
                "history.size_stability_samples must be >= 2",
            ));
        }
        check::unit("history.size_smoothing", self.size_smoothing)?;
        check::positive("history.size_stability_threshold", self.size_stability_threshold)?;
        check::positive("history.significant_size_change", self.significant_size_change)
    }
}

/// Rolling windows of fingertip coordinates, hand size, and hand center.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    config: HistoryConfig,
    finger_y: [Window<f64>; 4],
    finger_x: [Window<f64>; 2],
    size: Window<f64>,
    last_smoothed_size: Option<f64>,
    size_change_log: Window<f64>,
    center: Window<Point2D>,
    tips: [Window<Point2D>; 5],
    movement_cache: Cell<Option<f64>>,
}

impl HistoryBuffer {
    pub fn new(config: HistoryConfig) -> Self {
        let finger = config.finger_capacity;
        let tip = config.tip_capacity;
        Self {
            finger_y: std::array::from_fn(|_| Window::new(finger)),
            finger_x: std::array::from_fn(|_| Window::new(finger)),
            size: Window::new(config.size_capacity),
            last_smoothed_size: None,
            size_change_log: Window::new(config.size_change_log_capacity),
            center: Window::new(config.center_capacity),
            tips: std::array::from_fn(|_| Window::new(tip)),
            movement_cache: Cell::new(None),
            config,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Record one frame's raw fingertips for smoothing.
    pub fn push_tips(&mut self, tips: &FingerTips) {
        for (finger, tip) in tips.iter() {
            self.tips[finger.slot()].push(tip);
        }
    }

    /// Append one on-surface frame to every window.
    ///
    /// `hand_size` goes through a one-pole low-pass before it is stored.
    /// A non-finite or non-positive size is replaced with the previous
    /// smoothed value.
    pub fn update(&mut self, tips: &FingerTips, hand_size: f64, hand_center: Point2D) {
        for (slot, finger) in Y_TRACKED.iter().enumerate() {
            self.finger_y[slot].push(tips[*finger].y);
        }
        for (slot, finger) in X_TRACKED.iter().enumerate() {
            self.finger_x[slot].push(tips[*finger].x);
        }

        let smoothed = self.smooth_size(hand_size);
        if let Some(previous) = self.size.last().copied() {
            let change = relative_change(previous, smoothed).abs();
            if change > self.config.significant_size_change {
                self.size_change_log.push(change);
            }
        }
        self.size.push(smoothed);

        if hand_center.is_finite() {
            self.center.push(hand_center);
        } else if let Some(last) = self.center.last().copied() {
            self.center.push(last);
        }

        self.movement_cache.set(None);
    }

    fn smooth_size(&mut self, raw: f64) -> f64 {
        let valid = raw.is_finite() && raw > 0.0;
        let smoothed = match (self.last_smoothed_size, valid) {
            (Some(last), true) => {
                let k = self.config.size_smoothing;
                raw * (1.0 - k) + last * k
            }
            (Some(last), false) => last,
            (None, true) => raw,
            (None, false) => return 0.0,
        };
        self.last_smoothed_size = Some(smoothed);
        smoothed
    }

    /// Distance between the oldest and newest hand center in the window.
    pub fn movement_amount(&self) -> f64 {
        if let Some(cached) = self.movement_cache.get() {
            return cached;
        }
        let movement = match (self.center.first(), self.center.last()) {
            (Some(first), Some(last)) if self.center.len() >= 2 => last.distance_to(first),
            _ => 0.0,
        };
        self.movement_cache.set(Some(movement));
        movement
    }

    /// Whether the recent hand size is steady (no pinch, lift, or push).
    pub fn is_size_stable(&self) -> bool {
        if self.size.len() < 2 {
            return true;
        }
        let take = self.config.size_stability_samples.min(self.size.len());
        let recent: Vec<f64> = self.size.iter().skip(self.size.len() - take).copied().collect();
        let changes: Vec<f64> = recent
            .windows(2)
            .map(|pair| relative_change(pair[0], pair[1]).abs())
            .collect();
        if changes.is_empty() {
            return true;
        }
        let mean = changes.iter().sum::<f64>() / changes.len() as f64;
        if !mean.is_finite() {
            return true;
        }
        mean <= self.config.size_stability_threshold
    }

    /// Signed relative frame-to-frame size changes, oldest first.
    pub fn size_changes(&self) -> Vec<f64> {
        let sizes = self.size.to_vec();
        sizes
            .windows(2)
            .map(|pair| relative_change(pair[0], pair[1]))
            .collect()
    }

    /// Recent relative size changes above the significance threshold.
    pub fn size_change_log(&self) -> Vec<f64> {
        self.size_change_log.to_vec()
    }

    /// Distance between the oldest and newest raw sample of one fingertip.
    pub fn finger_movement(&self, finger: Finger) -> f64 {
        let window = &self.tips[finger.slot()];
        match (window.first(), window.last()) {
            (Some(first), Some(last)) if window.len() >= 2 => last.distance_to(first),
            _ => 0.0,
        }
    }

    /// Mean movement over the fingers that moved at all.
    pub fn average_finger_movement(&self) -> f64 {
        let moving: Vec<f64> = Finger::ALL
            .iter()
            .map(|f| self.finger_movement(*f))
            .filter(|m| *m > 0.0)
            .collect();
        if moving.is_empty() {
            return 0.0;
        }
        moving.iter().sum::<f64>() / moving.len() as f64
    }

    /// Y window of a tracked finger. `None` for the thumb.
    pub fn y_window(&self, finger: Finger) -> Option<&Window<f64>> {
        Y_TRACKED
            .iter()
            .position(|f| *f == finger)
            .map(|slot| &self.finger_y[slot])
    }

    /// X window of index or middle.
    pub fn x_window(&self, finger: Finger) -> Option<&Window<f64>> {
        X_TRACKED
            .iter()
            .position(|f| *f == finger)
            .map(|slot| &self.finger_x[slot])
    }

    /// Absolute Y displacement of a finger across its window.
    pub fn y_travel(&self, finger: Finger) -> f64 {
        self.y_window(finger)
            .map(|w| w.net_change().abs())
            .unwrap_or(0.0)
    }

    /// Raw samples of one fingertip, oldest first.
    pub fn tip_window(&self, finger: Finger) -> &Window<Point2D> {
        &self.tips[finger.slot()]
    }

    pub fn sizes(&self) -> Vec<f64> {
        self.size.to_vec()
    }

    /// Number of samples currently held in the size window.
    pub fn len(&self) -> usize {
        self.size.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Every window that feeds state decisions is full.
    pub fn is_ready(&self) -> bool {
        self.finger_y.iter().all(Window::is_full)
            && self.finger_x.iter().all(Window::is_full)
            && self.size.is_full()
            && self.center.is_full()
    }

    /// Clear every window and the smoothed size.
    pub fn reset(&mut self) {
        for window in self.finger_y.iter_mut().chain(self.finger_x.iter_mut()) {
            window.clear();
        }
        self.size.clear();
        self.last_smoothed_size = None;
        self.size_change_log.clear();
        self.center.clear();
        for window in &mut self.tips {
            window.clear();
        }
        self.movement_cache.set(None);
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

/// `(current - previous) / previous`, zero when `previous` is zero.
fn relative_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 || !previous.is_finite() || !current.is_finite() {
        return 0.0;
    }
    (current - previous) / previous
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tips_at(index_y: f64) -> FingerTips {
        let mut tips = FingerTips::default();
        for (slot, finger) in Finger::ALL.iter().enumerate() {
            tips.set(*finger, Point2D::new(100.0 + slot as f64 * 20.0, 200.0));
        }
        tips.set(Finger::Index, Point2D::new(120.0, index_y));
        tips
    }

    fn feed(history: &mut HistoryBuffer, sizes: &[f64]) {
        for size in sizes {
            history.update(&tips_at(200.0), *size, Point2D::new(300.0, 300.0));
        }
    }

    #[test]
    fn test_empty_history_is_stable_and_still() {
        let history = HistoryBuffer::default();
        assert!(history.is_size_stable());
        assert_eq!(history.movement_amount(), 0.0);
        assert!(history.size_changes().is_empty());
        assert!(!history.is_ready());
    }

    #[test]
    fn test_single_sample_is_stable() {
        let mut history = HistoryBuffer::default();
        feed(&mut history, &[0.5]);
        assert!(history.is_size_stable());
    }

    #[test]
    fn test_size_is_smoothed() {
        let mut history = HistoryBuffer::default();
        feed(&mut history, &[1.0, 2.0]);
        let sizes = history.sizes();
        assert_eq!(sizes[0], 1.0);
        // 2.0 * 0.3 + 1.0 * 0.7
        assert!((sizes[1] - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_zero_size_does_not_poison_stability() {
        let mut history = HistoryBuffer::default();
        feed(&mut history, &[0.0, 0.4, 0.0, 0.4, f64::NAN, 0.4]);
        assert_eq!(history.sizes(), vec![0.0, 0.4, 0.4, 0.4, 0.4, 0.4]);
        assert!(history.is_size_stable());
        assert!(history.size_changes().iter().all(|c| c.is_finite()));
        assert!(history.sizes().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_unstable_size_detected() {
        let mut history = HistoryBuffer::default();
        feed(&mut history, &[0.3, 0.45, 0.6, 0.75]);
        assert!(!history.is_size_stable());
        assert!(!history.size_change_log().is_empty());
    }

    #[test]
    fn test_movement_amount_uses_window_ends() {
        let mut history = HistoryBuffer::default();
        for x in [0.0, 10.0, 3.0, 4.0] {
            history.update(&tips_at(200.0), 0.4, Point2D::new(x, 0.0));
        }
        assert!((history.movement_amount() - 4.0).abs() < 1e-12);

        history.update(&tips_at(200.0), 0.4, Point2D::new(7.0, 4.0));
        assert!((history.movement_amount() - 8.062257748298549).abs() < 1e-9);
    }

    #[test]
    fn test_constant_center_means_no_movement() {
        let mut history = HistoryBuffer::default();
        feed(&mut history, &[0.4; 10]);
        assert_eq!(history.movement_amount(), 0.0);
        assert!(history.is_ready());
    }

    #[test]
    fn test_y_windows_track_fingers() {
        let mut history = HistoryBuffer::default();
        for y in [200.0, 190.0, 170.0] {
            history.update(&tips_at(y), 0.4, Point2D::ORIGIN);
        }
        assert_eq!(
            history.y_window(Finger::Index).unwrap().to_vec(),
            vec![200.0, 190.0, 170.0]
        );
        assert!(history.y_window(Finger::Thumb).is_none());
        assert!(history.x_window(Finger::Ring).is_none());
        assert!((history.y_travel(Finger::Index) - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_finger_movement_and_average() {
        let mut history = HistoryBuffer::default();
        history.push_tips(&tips_at(200.0));
        assert_eq!(history.finger_movement(Finger::Index), 0.0);

        history.push_tips(&tips_at(206.0));
        history.push_tips(&tips_at(208.0));
        assert!((history.finger_movement(Finger::Index) - 8.0).abs() < 1e-12);
        // Only the index moved.
        assert!((history.average_finger_movement() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_reset_twice_matches_once() {
        let mut history = HistoryBuffer::default();
        feed(&mut history, &[0.4, 0.5, 0.6]);
        history.push_tips(&tips_at(200.0));

        history.reset();
        let once = format!("{history:?}");
        history.reset();
        let twice = format!("{history:?}");

        assert_eq!(once, twice);
        assert_eq!(history.movement_amount(), 0.0);
        assert!(history.is_empty());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = HistoryConfig {
            finger_capacity: 0,
            ..HistoryConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(HistoryConfig::default().validate().is_ok());
    }
}

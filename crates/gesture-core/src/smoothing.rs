//! Input smoothing applied before anything reaches the history windows.
//!
//! Two stages, both optional:
//! - [`LandmarkFilter`]: per-landmark velocity filter on the raw skeleton
//! - [`FingertipSmoother`]: per-finger smoothing of fingertip pixels

use serde::{Deserialize, Serialize};

use handpad_common::error::HandpadResult;
use handpad_hand_model::geometry::Point2D;
use handpad_hand_model::landmarks::{Finger, FingerTips, HandLandmarks, Landmark, LANDMARK_COUNT};

use crate::check;
use crate::history::HistoryBuffer;

/// Fingertip smoothing mode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FingertipSmoothing {
    /// Mean of the raw samples held in the history tip windows.
    #[default]
    TemporalMean,

    /// Exponential moving average.
    ///
    /// `strength` is in [0.0, 1.0], where larger values mean more smoothing.
    Ema { strength: f64 },

    /// Pass raw fingertips through.
    None,
}

/// Velocity filter settings for raw landmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkFilterConfig {
    pub enabled: bool,
    /// Weight of the current frame velocity against the previous one.
    pub velocity_blend: f64,
    /// Weight of the filtered position against the previous position.
    pub position_smoothing: f64,
}

impl Default for LandmarkFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            velocity_blend: 0.7,
            position_smoothing: 0.5,
        }
    }
}

/// Smoothing settings for a session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub fingertips: FingertipSmoothing,
    pub landmarks: LandmarkFilterConfig,
}

impl SmoothingConfig {
    pub fn validate(&self) -> HandpadResult<()> {
        if let FingertipSmoothing::Ema { strength } = self.fingertips {
            check::unit("smoothing.fingertips.strength", strength)?;
        }
        check::unit("smoothing.landmarks.velocity_blend", self.landmarks.velocity_blend)?;
        check::unit(
            "smoothing.landmarks.position_smoothing",
            self.landmarks.position_smoothing,
        )
    }
}

/// Per-finger fingertip smoother.
#[derive(Debug, Clone)]
pub struct FingertipSmoother {
    mode: FingertipSmoothing,
    ema: Option<FingerTips>,
}

impl FingertipSmoother {
    pub fn new(mode: FingertipSmoothing) -> Self {
        Self { mode, ema: None }
    }

    pub fn mode(&self) -> FingertipSmoothing {
        self.mode
    }

    /// Smooth this frame's raw fingertips.
    ///
    /// Temporal mean reads the tip windows, so `raw` must already have
    /// been pushed with [`HistoryBuffer::push_tips`].
    pub fn smooth(&mut self, raw: &FingerTips, history: &HistoryBuffer) -> FingerTips {
        match self.mode {
            FingertipSmoothing::TemporalMean => {
                let mut out = *raw;
                for finger in Finger::ALL {
                    if let Some(mean) = Point2D::mean(history.tip_window(finger).iter()) {
                        out.set(finger, mean);
                    }
                }
                out
            }
            FingertipSmoothing::Ema { strength } => {
                let alpha = (1.0 - strength).clamp(0.0, 1.0);
                let previous = self.ema.unwrap_or(*raw);
                let mut out = *raw;
                for finger in Finger::ALL {
                    let p = previous[finger];
                    let c = raw[finger];
                    out.set(
                        finger,
                        Point2D::new(
                            alpha * c.x + (1.0 - alpha) * p.x,
                            alpha * c.y + (1.0 - alpha) * p.y,
                        ),
                    );
                }
                self.ema = Some(out);
                out
            }
            FingertipSmoothing::None => *raw,
        }
    }

    pub fn reset(&mut self) {
        self.ema = None;
    }
}

/// Velocity-based jitter filter over all 21 landmarks.
///
/// Each landmark's frame velocity is blended with its previous filtered
/// velocity, the landmark is advanced from its previous filtered position
/// by that velocity, and the result is blended once more with the
/// previous position.
#[derive(Debug, Clone)]
pub struct LandmarkFilter {
    velocity_blend: f64,
    position_smoothing: f64,
    previous: Option<[Landmark; LANDMARK_COUNT]>,
    velocity: [Point2D; LANDMARK_COUNT],
}

impl LandmarkFilter {
    pub fn new(config: &LandmarkFilterConfig) -> Self {
        Self {
            velocity_blend: config.velocity_blend,
            position_smoothing: config.position_smoothing,
            previous: None,
            velocity: [Point2D::ORIGIN; LANDMARK_COUNT],
        }
    }

    pub fn apply(&mut self, hand: &HandLandmarks) -> HandLandmarks {
        let Some(previous) = self.previous else {
            self.previous = Some(hand.points);
            self.velocity = [Point2D::ORIGIN; LANDMARK_COUNT];
            return hand.clone();
        };

        let vb = self.velocity_blend;
        let ps = self.position_smoothing;
        let mut filtered = hand.clone();
        for (i, point) in filtered.points.iter_mut().enumerate() {
            let prev = previous[i];
            let current_velocity = Point2D::new(point.x - prev.x, point.y - prev.y);
            let v = Point2D::new(
                vb * current_velocity.x + (1.0 - vb) * self.velocity[i].x,
                vb * current_velocity.y + (1.0 - vb) * self.velocity[i].y,
            );

            let advanced_x = prev.x + v.x;
            let advanced_y = prev.y + v.y;
            point.x = ps * advanced_x + (1.0 - ps) * prev.x;
            point.y = ps * advanced_y + (1.0 - ps) * prev.y;

            self.velocity[i] = v;
        }

        self.previous = Some(filtered.points);
        filtered
    }

    pub fn reset(&mut self) {
        self.previous = None;
        self.velocity = [Point2D::ORIGIN; LANDMARK_COUNT];
    }
}

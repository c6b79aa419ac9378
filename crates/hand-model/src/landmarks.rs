//! Hand landmark contracts.
//!
//! The pose-estimation collaborator yields 21 named points per hand, with
//! `x`/`y` normalized to `[0.0, 1.0]` against the camera frame and an
//! optional relative depth `z`. Everything downstream of this module works
//! in camera pixels: use [`HandLandmarks::info`] to convert.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// Number of landmarks in one hand skeleton.
pub const LANDMARK_COUNT: usize = 21;

/// Named landmark positions, in skeleton order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkId {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl LandmarkId {
    /// Position of this landmark in the skeleton array.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One landmark point (normalized image coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    /// Relative depth; zero when the detector does not provide one.
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Scale to camera pixels.
    pub fn to_pixels(&self, width: u32, height: u32) -> Point2D {
        Point2D::new(self.x * width as f64, self.y * height as f64)
    }
}

/// The five fingers, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Slot of this finger in five-element per-finger arrays.
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Distal landmark of the finger.
    pub fn tip(self) -> LandmarkId {
        match self {
            Finger::Thumb => LandmarkId::ThumbTip,
            Finger::Index => LandmarkId::IndexTip,
            Finger::Middle => LandmarkId::MiddleTip,
            Finger::Ring => LandmarkId::RingTip,
            Finger::Pinky => LandmarkId::PinkyTip,
        }
    }

    /// Knuckle the finger direction is measured from.
    pub fn base(self) -> LandmarkId {
        match self {
            Finger::Thumb => LandmarkId::ThumbMcp,
            Finger::Index => LandmarkId::IndexMcp,
            Finger::Middle => LandmarkId::MiddleMcp,
            Finger::Ring => LandmarkId::RingMcp,
            Finger::Pinky => LandmarkId::PinkyMcp,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Finger::Thumb => "thumb",
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fingertip pixel positions for one frame, indexed by [`Finger`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FingerTips(pub [Point2D; 5]);

impl FingerTips {
    pub fn get(&self, finger: Finger) -> Point2D {
        self.0[finger.slot()]
    }

    pub fn set(&mut self, finger: Finger, point: Point2D) {
        self.0[finger.slot()] = point;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Finger, Point2D)> + '_ {
        Finger::ALL.iter().map(move |f| (*f, self.0[f.slot()]))
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(Point2D::is_finite)
    }
}

impl Index<Finger> for FingerTips {
    type Output = Point2D;

    fn index(&self, finger: Finger) -> &Point2D {
        &self.0[finger.slot()]
    }
}

/// Which hand the skeleton belongs to, as seen by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    Left,
    Right,
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Left => f.write_str("Left Hand"),
            Handedness::Right => f.write_str("Right Hand"),
        }
    }
}

/// Error building a skeleton from an arbitrary point list.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LandmarkError {
    #[error("expected 21 landmarks, got {0}")]
    WrongCount(usize),
}

/// A full hand skeleton for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandLandmarks {
    pub points: [Landmark; LANDMARK_COUNT],

    /// Detector confidence in `[0.0, 1.0]`.
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

/// Typed per-frame summary of a hand, in camera pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandInfo {
    pub label: Handedness,
    pub finger_tips: FingerTips,
    /// Tip minus knuckle per finger (normalized units).
    pub finger_directions: [Point2D; 5],
    /// Index knuckle to pinky knuckle (normalized units).
    pub hand_direction: Point2D,
}

impl HandLandmarks {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self {
            points,
            confidence: 1.0,
        }
    }

    /// Build from a point list, which must hold exactly [`LANDMARK_COUNT`] entries.
    pub fn from_points(points: Vec<Landmark>) -> Result<Self, LandmarkError> {
        let len = points.len();
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongCount(len))?;
        Ok(Self::new(points))
    }

    pub fn get(&self, id: LandmarkId) -> Landmark {
        self.points[id.index()]
    }

    /// Every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }

    /// Diagonal of the landmark bounding box (normalized units).
    ///
    /// Grows as the hand approaches the camera, so relative changes of
    /// this value read as pinch/spread or lift.
    pub fn hand_size(&self) -> f64 {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        (max_x - min_x).hypot(max_y - min_y)
    }

    /// Mean of all landmarks in camera pixels.
    pub fn center_px(&self, width: u32, height: u32) -> Point2D {
        let pixels: Vec<Point2D> = self
            .points
            .iter()
            .map(|p| p.to_pixels(width, height))
            .collect();
        Point2D::mean(pixels.iter()).unwrap_or_default()
    }

    /// Fingertip positions in camera pixels.
    pub fn fingertips_px(&self, width: u32, height: u32) -> FingerTips {
        let mut tips = FingerTips::default();
        for finger in Finger::ALL {
            tips.set(finger, self.get(finger.tip()).to_pixels(width, height));
        }
        tips
    }

    /// Left when the wrist sits left of the middle knuckle in the image.
    pub fn handedness(&self) -> Handedness {
        if self.get(LandmarkId::Wrist).x < self.get(LandmarkId::MiddleMcp).x {
            Handedness::Left
        } else {
            Handedness::Right
        }
    }

    pub fn info(&self, width: u32, height: u32) -> HandInfo {
        let mut finger_directions = [Point2D::ORIGIN; 5];
        for finger in Finger::ALL {
            let tip = self.get(finger.tip());
            let base = self.get(finger.base());
            finger_directions[finger.slot()] = Point2D::new(tip.x - base.x, tip.y - base.y);
        }

        let index_mcp = self.get(LandmarkId::IndexMcp);
        let pinky_mcp = self.get(LandmarkId::PinkyMcp);

        HandInfo {
            label: self.handedness(),
            finger_tips: self.fingertips_px(width, height),
            finger_directions,
            hand_direction: Point2D::new(pinky_mcp.x - index_mcp.x, pinky_mcp.y - index_mcp.y),
        }
    }
}

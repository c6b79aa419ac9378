//! Synthetic hand skeletons for simulation and tests.
//!
//! Builds a plausible 21-point skeleton in camera pixels around a palm
//! anchor. Fingertips can be moved independently; the rest of the finger
//! stays put, so a fingertip excursion shifts the hand center by only
//! 1/21 of its length and leaves the bounding box (hand size) untouched
//! as long as the tip stays inside it.

use crate::geometry::Point2D;
use crate::landmarks::{Finger, HandLandmarks, Landmark, LandmarkId, LANDMARK_COUNT};

/// Default tip offsets from the palm anchor, thumb first.
const TIP_OFFSETS: [(f64, f64); 5] = [
    (-70.0, -30.0),
    (-36.0, -110.0),
    (-8.0, -125.0),
    (20.0, -115.0),
    (45.0, -90.0),
];

/// Knuckle offsets from the palm anchor, thumb first.
const MCP_OFFSETS: [(f64, f64); 5] = [
    (-50.0, 20.0),
    (-33.0, -15.0),
    (-8.0, -18.0),
    (16.0, -15.0),
    (38.0, -8.0),
];

const WRIST_OFFSET: (f64, f64) = (0.0, 90.0);
const THUMB_CMC_OFFSET: (f64, f64) = (-30.0, 60.0);

/// A hand skeleton under construction, in camera pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticHand {
    frame_width: u32,
    frame_height: u32,
    palm: Point2D,
    tip_shift: [Point2D; 5],
}

impl SyntheticHand {
    /// A relaxed hand centered on `palm` (pixels).
    pub fn new(frame_width: u32, frame_height: u32, palm: Point2D) -> Self {
        Self {
            frame_width,
            frame_height,
            palm,
            tip_shift: [Point2D::ORIGIN; 5],
        }
    }

    pub fn palm(&self) -> Point2D {
        self.palm
    }

    /// Move the whole hand.
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.palm.x += dx;
        self.palm.y += dy;
        self
    }

    /// Displace one fingertip from its relaxed position.
    pub fn shift_tip(&mut self, finger: Finger, dx: f64, dy: f64) -> &mut Self {
        self.tip_shift[finger.slot()] = Point2D::new(dx, dy);
        self
    }

    /// Return every fingertip to its relaxed position.
    pub fn relax(&mut self) -> &mut Self {
        self.tip_shift = [Point2D::ORIGIN; 5];
        self
    }

    /// Current fingertip position in pixels.
    pub fn tip(&self, finger: Finger) -> Point2D {
        let (ox, oy) = TIP_OFFSETS[finger.slot()];
        let shift = self.tip_shift[finger.slot()];
        Point2D::new(self.palm.x + ox + shift.x, self.palm.y + oy + shift.y)
    }

    /// Normalized skeleton for the current pose.
    pub fn landmarks(&self) -> HandLandmarks {
        let mut px = [Point2D::ORIGIN; LANDMARK_COUNT];
        let at = |offset: (f64, f64)| Point2D::new(self.palm.x + offset.0, self.palm.y + offset.1);

        px[LandmarkId::Wrist.index()] = at(WRIST_OFFSET);
        px[LandmarkId::ThumbCmc.index()] = at(THUMB_CMC_OFFSET);

        for finger in Finger::ALL {
            let mcp = at(MCP_OFFSETS[finger.slot()]);
            let relaxed_tip = at(TIP_OFFSETS[finger.slot()]);
            let base = finger.base().index();
            let tip = finger.tip().index();

            px[base] = mcp;
            // The two joints between knuckle and tip sit at thirds of the
            // relaxed finger.
            px[base + 1] = Point2D::lerp(&mcp, &relaxed_tip, 1.0 / 3.0);
            px[base + 2] = Point2D::lerp(&mcp, &relaxed_tip, 2.0 / 3.0);
            px[tip] = self.tip(finger);
        }

        let w = self.frame_width.max(1) as f64;
        let h = self.frame_height.max(1) as f64;
        let mut points = [Landmark::default(); LANDMARK_COUNT];
        for (slot, p) in px.iter().enumerate() {
            points[slot] = Landmark::new(p.x / w, p.y / h);
        }
        HandLandmarks::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tips_round_trip_through_pixels() {
        let hand = SyntheticHand::new(640, 480, Point2D::new(320.0, 300.0));
        let tips = hand.landmarks().fingertips_px(640, 480);
        for finger in Finger::ALL {
            assert!(tips[finger].distance_to(&hand.tip(finger)) < 1e-6);
        }
    }

    #[test]
    fn test_tip_shift_inside_bbox_keeps_size() {
        let mut hand = SyntheticHand::new(640, 480, Point2D::new(320.0, 300.0));
        let relaxed = hand.landmarks().hand_size();
        hand.shift_tip(Finger::Index, 0.0, 30.0);
        let shifted = hand.landmarks().hand_size();
        assert!((relaxed - shifted).abs() < 1e-12);
    }

    #[test]
    fn test_translate_moves_center() {
        let mut hand = SyntheticHand::new(640, 480, Point2D::new(320.0, 300.0));
        let before = hand.landmarks().center_px(640, 480);
        hand.translate(10.0, -5.0);
        let after = hand.landmarks().center_px(640, 480);
        assert!((after.x - before.x - 10.0).abs() < 1e-6);
        assert!((after.y - before.y + 5.0).abs() < 1e-6);
    }
}

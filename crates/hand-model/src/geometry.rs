//! 2D point type shared by every Handpad crate.
//!
//! Points are in camera-frame pixels unless a type says otherwise.

use serde::{Deserialize, Serialize};

/// A 2D point (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Component-wise difference `self - other`.
    pub fn delta_from(&self, other: &Point2D) -> Point2D {
        Point2D::new(self.x - other.x, self.y - other.y)
    }

    /// Vector length when the point is read as a displacement.
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Both coordinates are finite (no NaN, no infinity).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Linear interpolation between two points.
    pub fn lerp(a: &Point2D, b: &Point2D, t: f64) -> Point2D {
        let t = t.clamp(0.0, 1.0);
        Point2D {
            x: a.x + (b.x - a.x) * t,
            y: a.y + (b.y - a.y) * t,
        }
    }

    /// Arithmetic mean of a set of points. `None` for an empty set.
    pub fn mean<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Option<Point2D> {
        let mut count = 0usize;
        let mut sum = Point2D::ORIGIN;
        for p in points {
            sum.x += p.x;
            sum.y += p.y;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Point2D::new(sum.x / count as f64, sum.y / count as f64))
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

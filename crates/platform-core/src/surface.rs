//! Surface locator contract and a polygon-backed implementation.
//!
//! The gesture core treats the surface purely as a gate ("is the fingertip
//! on the surface, and is the surface locked?") and its center purely as
//! the cursor-mapping origin. Contour detection lives outside this crate.

use handpad_common::error::{HandpadError, HandpadResult};
use handpad_hand_model::geometry::Point2D;

/// Something that knows where the interaction surface is.
pub trait SurfaceLocator {
    /// Whether a camera-pixel point lies on the surface.
    fn is_point_inside(&self, point: Point2D) -> bool;

    /// Whether the surface is stable enough to interact with.
    fn is_locked(&self) -> bool;

    /// Surface center in camera pixels, once known.
    fn center(&self) -> Option<Point2D>;
}

/// A surface described by a closed contour in camera pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonSurface {
    contour: Vec<Point2D>,
    locked: bool,
    center: Option<Point2D>,
}

impl PolygonSurface {
    /// Build from a contour. Needs at least three vertices.
    pub fn new(contour: Vec<Point2D>) -> HandpadResult<Self> {
        if contour.len() < 3 {
            return Err(HandpadError::surface(format!(
                "surface contour needs at least 3 points, got {}",
                contour.len()
            )));
        }
        if !contour.iter().all(Point2D::is_finite) {
            return Err(HandpadError::surface("surface contour has non-finite points"));
        }
        let center = polygon_centroid(&contour);
        Ok(Self {
            contour,
            locked: false,
            center,
        })
    }

    /// Axis-aligned rectangular surface.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> HandpadResult<Self> {
        Self::new(vec![
            Point2D::new(x, y),
            Point2D::new(x + width, y),
            Point2D::new(x + width, y + height),
            Point2D::new(x, y + height),
        ])
    }

    /// A surface covering the whole camera frame.
    pub fn full_frame(frame_width: u32, frame_height: u32) -> HandpadResult<Self> {
        Self::rect(0.0, 0.0, frame_width as f64, frame_height as f64)
    }

    /// Mark the surface as locked (or unlocked).
    pub fn set_locked(&mut self, locked: bool) {
        if self.locked != locked {
            tracing::debug!(locked, "Surface lock changed");
        }
        self.locked = locked;
    }

    /// Builder form of [`PolygonSurface::set_locked`].
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn contour(&self) -> &[Point2D] {
        &self.contour
    }
}

impl SurfaceLocator for PolygonSurface {
    /// Even-odd ray casting.
    fn is_point_inside(&self, point: Point2D) -> bool {
        if !point.is_finite() {
            return false;
        }

        let mut inside = false;
        let n = self.contour.len();
        let mut j = n - 1;
        for i in 0..n {
            let a = self.contour[i];
            let b = self.contour[j];
            if (a.y > point.y) != (b.y > point.y) {
                let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
                if point.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn center(&self) -> Option<Point2D> {
        self.center
    }
}

/// Area centroid of a simple polygon, falling back to the vertex mean
/// for degenerate (zero-area) contours.
fn polygon_centroid(contour: &[Point2D]) -> Option<Point2D> {
    let n = contour.len();
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let a = contour[i];
        let b = contour[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }

    if area2.abs() < 1e-9 {
        return Point2D::mean(contour.iter());
    }
    Some(Point2D::new(cx / (3.0 * area2), cy / (3.0 * area2)))
}

//! Handpad platform core contracts.
//!
//! This crate defines the collaborators the gesture core talks to without
//! coupling it to a concrete camera, pose model, or OS input backend:
//!
//! - **Sources:** [`HandPoseSource`] yields one hand skeleton per frame
//! - **Surfaces:** [`SurfaceLocator`] gates interaction and anchors the cursor
//! - **Sinks:** [`CursorSink`] performs cursor moves and button/scroll actions

pub mod sink;
pub mod source;
pub mod surface;

use serde::{Deserialize, Serialize};

pub use sink::{dispatch_gesture, CursorSink, RecordingSink, SinkCommand, TracingSink};
pub use source::HandPoseSource;
pub use surface::{PolygonSurface, SurfaceLocator};

/// Screen area the cursor may occupy, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenBounds {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl ScreenBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp a position into `[0, width] x [0, height]`.
    ///
    /// Non-finite input collapses to the nearest edge (NaN to zero).
    pub fn clamp(&self, x: f64, y: f64) -> (f64, f64) {
        (
            clamp_axis(x, self.width as f64),
            clamp_axis(y, self.height as f64),
        )
    }

    /// Center of the screen.
    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Whether an emitted integer position lies inside the bounds.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x as i64 <= self.width as i64 && y as i64 <= self.height as i64
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

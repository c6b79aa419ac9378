//! Handpad Hand Model
//!
//! Defines the data contracts shared by the gesture core and its
//! collaborators:
//! - **Landmarks:** 21-point hand skeletons, fingers, fingertips, typed hand info
//! - **Frames:** timestamped per-frame input and the JSONL frame-stream format
//! - **Events:** logical gesture events emitted by the core
//! - **Synthetic:** skeleton builder for simulation and tests
//!
//! Landmarks are normalized to `[0.0, 1.0]` against the camera frame;
//! everything derived from them (fingertips, hand center) is in pixels.

pub mod event;
pub mod frame;
pub mod geometry;
pub mod landmarks;
pub mod synthetic;

pub use event::*;
pub use frame::*;
pub use geometry::*;
pub use landmarks::*;
pub use synthetic::SyntheticHand;

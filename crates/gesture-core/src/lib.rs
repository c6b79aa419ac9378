//! Handpad Gesture Core
//!
//! Turns a stream of hand frames into trackpad behavior:
//! - **History:** rolling fingertip, hand-size, and hand-center windows
//! - **Smoothing:** landmark jitter filter and fingertip smoothing
//! - **Gestures:** clicks, double tap, hold, scroll, zoom, rotate, swipe
//! - **Cursor:** accelerated, smoothed relative cursor motion
//! - **Session:** per-frame orchestration and hysteresis-voted state
//!
//! This crate is pure computation: no I/O, no async, no platform code.
//! Collaborators come in through the `handpad-platform-core` traits.

mod check;
pub mod cursor;
pub mod gestures;
pub mod history;
pub mod session;
pub mod smoothing;
pub mod state;
pub mod window;

pub use cursor::{CursorConfig, CursorController};
pub use gestures::{CooldownKind, GestureClassifier, GestureConfig, GestureInput};
pub use history::{HistoryBuffer, HistoryConfig};
pub use session::{FrameOutcome, Session, SessionConfig};
pub use smoothing::{
    FingertipSmoother, FingertipSmoothing, LandmarkFilter, LandmarkFilterConfig, SmoothingConfig,
};
pub use state::{SessionState, StateConfig, StateVoter};
pub use window::Window;

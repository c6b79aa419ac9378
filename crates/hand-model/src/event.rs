//! Gesture events produced by the gesture core.
//!
//! Events are logical: the cursor sink decides how each one maps to an OS
//! action. Serialized with an internal `type` tag so session logs stay
//! readable as JSONL.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Vertical direction of a two-finger scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Zoom in when the fingers converge, out when they diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomDirection {
    In,
    Out,
}

/// Horizontal direction shared by rotate and swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalDirection {
    Left,
    Right,
}

impl HorizontalDirection {
    /// Direction of a signed X displacement. Zero reads as right.
    pub fn from_dx(dx: f64) -> Self {
        if dx < 0.0 {
            HorizontalDirection::Left
        } else {
            HorizontalDirection::Right
        }
    }
}

/// A discrete gesture recognized on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    /// Single index-finger tap.
    IndexClick,
    /// Single middle-finger tap.
    MiddleClick,
    /// Index and middle tapped together.
    TwoFingerClick,
    /// Two index taps within the double-tap interval.
    DoubleTap,
    /// Index held still after a tap; press-and-hold begins.
    HoldStarted,
    /// A started hold ended (hand moved, left the surface, or was lost).
    HoldReleased,
    Scroll {
        direction: ScrollDirection,
    },
    Zoom {
        direction: ZoomDirection,
    },
    Rotate {
        direction: HorizontalDirection,
    },
    Swipe {
        direction: HorizontalDirection,
        /// Pinky moved together with index, middle, and ring.
        four_finger: bool,
    },
}

impl GestureEvent {
    /// Short stable name, used for logging and counters.
    pub fn name(&self) -> &'static str {
        match self {
            GestureEvent::IndexClick => "index_click",
            GestureEvent::MiddleClick => "middle_click",
            GestureEvent::TwoFingerClick => "two_finger_click",
            GestureEvent::DoubleTap => "double_tap",
            GestureEvent::HoldStarted => "hold_started",
            GestureEvent::HoldReleased => "hold_released",
            GestureEvent::Scroll { .. } => "scroll",
            GestureEvent::Zoom { .. } => "zoom",
            GestureEvent::Rotate { .. } => "rotate",
            GestureEvent::Swipe { .. } => "swipe",
        }
    }
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureEvent::Scroll { direction } => write!(f, "scroll {direction:?}"),
            GestureEvent::Zoom { direction } => write!(f, "zoom {direction:?}"),
            GestureEvent::Rotate { direction } => write!(f, "rotate {direction:?}"),
            GestureEvent::Swipe {
                direction,
                four_finger,
            } => {
                if *four_finger {
                    write!(f, "four-finger swipe {direction:?}")
                } else {
                    write!(f, "swipe {direction:?}")
                }
            }
            other => f.write_str(other.name()),
        }
    }
}

//! Recorded hand frames.
//!
//! A frame stream is stored as JSONL: one `#`-prefixed header line
//! followed by one [`HandFrame`] object per line.

use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;
use crate::landmarks::HandLandmarks;

/// Monotonic timestamp in nanoseconds since the session clock started.
pub type TimestampNs = u64;

/// One camera frame's worth of hand-tracking input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandFrame {
    #[serde(rename = "t")]
    pub timestamp_ns: TimestampNs,

    /// `None` when the pose detector found no hand.
    #[serde(default)]
    pub hand: Option<HandLandmarks>,

    /// Surface lock flag sampled alongside the frame.
    #[serde(default = "default_locked")]
    pub surface_locked: bool,
}

fn default_locked() -> bool {
    true
}

impl HandFrame {
    pub fn with_hand(timestamp_ns: TimestampNs, hand: HandLandmarks) -> Self {
        Self {
            timestamp_ns,
            hand: Some(hand),
            surface_locked: true,
        }
    }

    pub fn empty(timestamp_ns: TimestampNs) -> Self {
        Self {
            timestamp_ns,
            hand: None,
            surface_locked: true,
        }
    }

    /// Timestamp as fractional seconds.
    pub fn timestamp_secs(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }
}

/// Metadata written as the first line of a frame stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at stream start (RFC 3339).
    pub epoch_wall: String,

    /// Camera frame size in pixels.
    pub frame_width: u32,
    pub frame_height: u32,

    /// Nominal capture rate.
    pub fps: u32,

    /// Surface contour in camera pixels. Empty means the whole frame.
    #[serde(default)]
    pub surface: Vec<Point2D>,
}

impl FrameStreamHeader {
    pub const SCHEMA_VERSION: &'static str = "1.0";

    pub fn new(frame_width: u32, frame_height: u32, fps: u32) -> Self {
        Self {
            schema_version: Self::SCHEMA_VERSION.to_string(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
            frame_width,
            frame_height,
            fps,
            surface: Vec::new(),
        }
    }
}

/// Parse the `#` header line of a frame stream, if one is present.
pub fn parse_header(jsonl: &str) -> Option<Result<FrameStreamHeader, serde_json::Error>> {
    jsonl
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.strip_prefix('#'))
        .map(|header| serde_json::from_str(header.trim()))
}

/// Parse frames from JSONL content (one JSON object per line).
pub fn parse_frames(jsonl: &str) -> Result<Vec<HandFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize a header and frames to JSONL.
pub fn serialize_frames(
    header: &FrameStreamHeader,
    frames: &[HandFrame],
) -> Result<String, serde_json::Error> {
    let mut output = format!("# {}\n", serde_json::to_string(header)?);
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}

//! Recorded frame streams as a hand pose source.

use std::collections::VecDeque;
use std::path::Path;

use handpad_common::clock::SessionClock;
use handpad_common::error::{HandpadError, HandpadResult};
use handpad_hand_model::frame::{parse_frames, parse_header, FrameStreamHeader, HandFrame};
use handpad_hand_model::landmarks::HandLandmarks;
use handpad_platform_core::{HandPoseSource, PolygonSurface};

/// Replays a JSONL frame stream, keeping the recorded timestamps and
/// surface lock flags.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    name: String,
    header: Option<FrameStreamHeader>,
    frames: VecDeque<HandFrame>,
    total: usize,
}

impl ReplaySource {
    /// Load a frame stream from disk.
    pub fn from_path(path: &Path) -> HandpadResult<Self> {
        if !path.exists() {
            return Err(HandpadError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let mut source = Self::from_jsonl(&content)?;
        source.name = path.display().to_string();
        Ok(source)
    }

    /// Parse a frame stream held in memory.
    pub fn from_jsonl(content: &str) -> HandpadResult<Self> {
        let header = parse_header(content)
            .transpose()
            .map_err(|e| HandpadError::replay(format!("Invalid frame stream header: {e}")))?;
        let frames = parse_frames(content)
            .map_err(|e| HandpadError::replay(format!("Invalid frame line: {e}")))?;
        Ok(Self::from_frames(header, frames))
    }

    pub fn from_frames(header: Option<FrameStreamHeader>, frames: Vec<HandFrame>) -> Self {
        let backwards = frames
            .windows(2)
            .filter(|pair| pair[1].timestamp_ns < pair[0].timestamp_ns)
            .count();
        if backwards > 0 {
            tracing::warn!(backwards, "Frame stream timestamps are not monotonic");
        }

        let total = frames.len();
        Self {
            name: "replay".to_string(),
            header,
            frames: frames.into(),
            total,
        }
    }

    pub fn header(&self) -> Option<&FrameStreamHeader> {
        self.header.as_ref()
    }

    /// Frames not yet replayed.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Camera frame size from the header, or `fallback` without one.
    pub fn frame_size(&self, fallback: (u32, u32)) -> (u32, u32) {
        self.header
            .as_ref()
            .map(|h| (h.frame_width, h.frame_height))
            .unwrap_or(fallback)
    }

    /// Nominal frame rate from the header, or `fallback` without one.
    pub fn fps(&self, fallback: u32) -> u32 {
        self.header
            .as_ref()
            .map(|h| h.fps)
            .filter(|fps| *fps > 0)
            .unwrap_or(fallback)
    }

    /// Locked surface recorded in the header; the whole frame when the
    /// header has no contour.
    pub fn surface(&self, fallback_size: (u32, u32)) -> HandpadResult<PolygonSurface> {
        let (width, height) = self.frame_size(fallback_size);
        let surface = match self.header.as_ref().map(|h| h.surface.as_slice()) {
            Some(contour) if !contour.is_empty() => PolygonSurface::new(contour.to_vec())?,
            _ => PolygonSurface::full_frame(width, height)?,
        };
        Ok(surface.locked())
    }
}

impl HandPoseSource for ReplaySource {
    fn detect(&mut self) -> HandpadResult<Option<HandLandmarks>> {
        Ok(self.frames.pop_front().and_then(|frame| frame.hand))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }

    fn capture(&mut self, _clock: &SessionClock) -> HandpadResult<Option<HandFrame>> {
        Ok(self.frames.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handpad_hand_model::frame::serialize_frames;
    use handpad_hand_model::geometry::Point2D;
    use handpad_hand_model::synthetic::SyntheticHand;
    use handpad_platform_core::SurfaceLocator;

    fn stream() -> String {
        let mut header = FrameStreamHeader::new(640, 480, 30);
        header.surface = vec![
            Point2D::new(100.0, 100.0),
            Point2D::new(500.0, 100.0),
            Point2D::new(500.0, 400.0),
            Point2D::new(100.0, 400.0),
        ];
        let hand = SyntheticHand::new(640, 480, Point2D::new(320.0, 300.0)).landmarks();
        let mut unlocked = HandFrame::with_hand(66_000_000, hand.clone());
        unlocked.surface_locked = false;
        let frames = vec![
            HandFrame::with_hand(0, hand),
            HandFrame::empty(33_000_000),
            unlocked,
        ];
        serialize_frames(&header, &frames).unwrap()
    }

    #[test]
    fn test_capture_keeps_recorded_frames() {
        let clock = SessionClock::start();
        let mut source = ReplaySource::from_jsonl(&stream()).unwrap();
        assert_eq!(source.total(), 3);
        assert_eq!(source.fps(60), 30);

        let first = source.capture(&clock).unwrap().unwrap();
        assert_eq!(first.timestamp_ns, 0);
        assert!(first.hand.is_some());

        let second = source.capture(&clock).unwrap().unwrap();
        assert!(second.hand.is_none());

        let third = source.capture(&clock).unwrap().unwrap();
        assert!(!third.surface_locked);
        assert_eq!(third.timestamp_ns, 66_000_000);

        assert!(source.is_finished());
        assert!(source.capture(&clock).unwrap().is_none());
    }

    #[test]
    fn test_surface_from_header() {
        let source = ReplaySource::from_jsonl(&stream()).unwrap();
        let surface = source.surface((1, 1)).unwrap();
        assert!(surface.is_locked());
        assert!(surface.is_point_inside(Point2D::new(300.0, 200.0)));
        assert!(!surface.is_point_inside(Point2D::new(50.0, 50.0)));
    }

    #[test]
    fn test_headerless_stream_uses_fallbacks() {
        let source = ReplaySource::from_jsonl("{\"t\":0}\n{\"t\":1}\n").unwrap();
        assert!(source.header().is_none());
        assert_eq!(source.frame_size((320, 240)), (320, 240));
        let surface = source.surface((320, 240)).unwrap();
        assert!(surface.is_point_inside(Point2D::new(10.0, 10.0)));
    }

    #[test]
    fn test_bad_line_is_replay_error() {
        let err = ReplaySource::from_jsonl("{\"t\":0}\nnot json\n").unwrap_err();
        assert!(matches!(err, HandpadError::Replay { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ReplaySource::from_path(Path::new("/nonexistent/handpad/frames.jsonl")).unwrap_err();
        assert!(matches!(err, HandpadError::FileNotFound { .. }));
    }
}

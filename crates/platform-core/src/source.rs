//! Hand pose source contract.

use handpad_common::clock::SessionClock;
use handpad_common::error::HandpadResult;
use handpad_hand_model::frame::HandFrame;
use handpad_hand_model::landmarks::HandLandmarks;

/// Trait for hand pose backends (live detector, recorded stream, simulation).
pub trait HandPoseSource: Send {
    /// Detect the hand in the current frame. `None` means no hand this frame.
    fn detect(&mut self) -> HandpadResult<Option<HandLandmarks>>;

    /// Source name for logging.
    fn name(&self) -> &str;

    /// Whether the source has run out of frames. Live sources never finish.
    fn is_finished(&self) -> bool {
        false
    }

    /// Capture one timestamped frame, or `None` once the source is finished.
    ///
    /// Live sources stamp frames with the session clock; recorded sources
    /// override this to keep their own timestamps and lock flags.
    fn capture(&mut self, clock: &SessionClock) -> HandpadResult<Option<HandFrame>> {
        if self.is_finished() {
            return Ok(None);
        }
        let hand = self.detect()?;
        Ok(Some(HandFrame {
            timestamp_ns: clock.elapsed_ns(),
            hand,
            surface_locked: true,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handpad_hand_model::landmarks::{Landmark, LANDMARK_COUNT};

    struct CountingSource {
        remaining: usize,
    }

    impl HandPoseSource for CountingSource {
        fn detect(&mut self) -> HandpadResult<Option<HandLandmarks>> {
            self.remaining = self.remaining.saturating_sub(1);
            Ok(Some(HandLandmarks::new(
                [Landmark::new(0.5, 0.5); LANDMARK_COUNT],
            )))
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn is_finished(&self) -> bool {
            self.remaining == 0
        }
    }

    #[test]
    fn test_default_capture_stops_when_finished() {
        let clock = SessionClock::start();
        let mut source = CountingSource { remaining: 2 };

        assert!(source.capture(&clock).unwrap().is_some());
        let second = source.capture(&clock).unwrap().unwrap();
        assert!(second.hand.is_some());
        assert!(second.surface_locked);
        assert!(source.capture(&clock).unwrap().is_none());
    }
}

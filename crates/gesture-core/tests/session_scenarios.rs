use handpad_gesture_core::{FrameOutcome, Session, SessionConfig, SessionState};
use handpad_hand_model::event::{GestureEvent, MouseButton};
use handpad_hand_model::frame::HandFrame;
use handpad_hand_model::geometry::Point2D;
use handpad_hand_model::landmarks::Finger;
use handpad_hand_model::synthetic::SyntheticHand;
use handpad_platform_core::{PolygonSurface, RecordingSink, ScreenBounds, SinkCommand};

const FRAME_NS: u64 = 33_333_333;

struct Harness {
    session: Session,
    surface: PolygonSurface,
    sink: RecordingSink,
    hand: SyntheticHand,
    frame: u64,
}

impl Harness {
    fn new() -> Self {
        Self {
            session: Session::new(
                SessionConfig::default(),
                640,
                480,
                ScreenBounds::new(1920, 1080),
            )
            .expect("default config is valid"),
            surface: PolygonSurface::rect(0.0, 0.0, 640.0, 480.0)
                .expect("rect surface")
                .locked(),
            sink: RecordingSink::new(),
            hand: SyntheticHand::new(640, 480, Point2D::new(320.0, 300.0)),
            frame: 0,
        }
    }

    fn step(&mut self) -> FrameOutcome {
        let frame = HandFrame::with_hand(self.frame * FRAME_NS, self.hand.landmarks());
        self.push(frame)
    }

    fn step_without_hand(&mut self) -> FrameOutcome {
        let frame = HandFrame::empty(self.frame * FRAME_NS);
        self.push(frame)
    }

    fn push(&mut self, frame: HandFrame) -> FrameOutcome {
        self.frame += 1;
        self.session
            .process_frame(&frame, &self.surface, &mut self.sink)
    }

    fn rest(&mut self, frames: usize) -> Vec<FrameOutcome> {
        (0..frames).map(|_| self.step()).collect()
    }

    /// Press the index fingertip down for one frame, then relax.
    fn tap(&mut self, settle_frames: usize) -> Vec<FrameOutcome> {
        self.hand.shift_tip(Finger::Index, 0.0, 30.0);
        let mut outcomes = vec![self.step()];
        self.hand.relax();
        outcomes.extend(self.rest(settle_frames));
        outcomes
    }
}

fn gestures(outcomes: &[FrameOutcome]) -> Vec<GestureEvent> {
    outcomes.iter().filter_map(|o| o.gesture).collect()
}

#[test]
fn resting_hand_converges_to_hand_at_rest() {
    let mut h = Harness::new();
    let outcomes = h.rest(12);

    // Windows fill on frame 8; three votes later the state settles.
    assert!(outcomes[..9]
        .iter()
        .all(|o| o.state == SessionState::Initializing));
    assert_eq!(outcomes[9].state, SessionState::HandAtRest);
    assert!(outcomes[9].state_changed);
    assert!(outcomes[10..].iter().all(|o| o.state == SessionState::HandAtRest));
    assert!(outcomes.iter().all(|o| o.on_surface && o.gesture.is_none()));

    assert_eq!(h.session.history().movement_amount(), 0.0);
    assert!(h.session.history().is_ready());
    assert!(h.sink.commands().is_empty());
}

#[test]
fn single_tap_clicks_exactly_once() {
    let mut h = Harness::new();
    h.rest(10);
    let outcomes = h.tap(5);

    assert_eq!(gestures(&outcomes), vec![GestureEvent::IndexClick]);
    assert_eq!(
        h.sink.actions().copied().collect::<Vec<_>>(),
        vec![SinkCommand::Click {
            button: MouseButton::Left
        }]
    );
    assert_eq!(h.session.gestures_fired(), 1);
}

#[test]
fn held_tap_presses_and_lost_hand_releases() {
    let mut h = Harness::new();
    h.rest(10);
    let outcomes = h.tap(15);
    assert_eq!(
        gestures(&outcomes),
        vec![GestureEvent::IndexClick, GestureEvent::HoldStarted]
    );
    assert!(h.session.classifier().is_holding());

    let lost = h.step_without_hand();
    assert_eq!(lost.gesture, Some(GestureEvent::HoldReleased));
    assert_eq!(lost.state, SessionState::Initializing);
    assert_eq!(h.sink.commands().last(), Some(&SinkCommand::MouseUp));
    assert!(h.sink.commands().contains(&SinkCommand::MouseDown));
}

#[test]
fn leaving_the_surface_is_immediate_and_resets() {
    let mut h = Harness::new();
    h.rest(10);
    assert_eq!(h.session.state(), SessionState::HandAtRest);

    let mut frame = HandFrame::with_hand(h.frame * FRAME_NS, h.hand.landmarks());
    frame.surface_locked = false;
    let off = h.push(frame);
    assert!(!off.on_surface);
    assert!(off.state_changed);
    assert_eq!(off.state, SessionState::HandOffSurface);
    assert!(h.session.history().is_empty());

    // Back on the surface the windows refill before the state is voted again.
    let back = h.rest(10);
    assert!(back[..9]
        .iter()
        .all(|o| o.state == SessionState::HandOffSurface));
    assert_eq!(back[9].state, SessionState::HandAtRest);
}

#[test]
fn fingertip_outside_polygon_counts_as_off_surface() {
    let mut h = Harness::new();
    h.surface = PolygonSurface::rect(400.0, 0.0, 240.0, 480.0)
        .expect("rect surface")
        .locked();
    let outcome = h.step();
    assert!(!outcome.on_surface);
    assert_eq!(outcome.state, SessionState::HandOffSurface);
}

#[test]
fn lost_hand_resets_to_initializing() {
    let mut h = Harness::new();
    h.rest(10);
    let lost = h.step_without_hand();
    assert_eq!(lost.state, SessionState::Initializing);
    assert!(lost.state_changed);
    assert!(lost.gesture.is_none());
    assert!(h.session.history().is_empty());
    assert!(!h.session.cursor().is_anchored());

    let again = h.step_without_hand();
    assert!(!again.state_changed);
}

#[test]
fn moving_hand_drives_the_cursor() {
    let mut h = Harness::new();
    h.rest(6);
    let mut outcomes = Vec::new();
    for _ in 0..15 {
        h.hand.translate(5.0, 0.0);
        outcomes.push(h.step());
    }

    assert!(gestures(&outcomes).is_empty());
    let moves: Vec<(i32, i32)> = h.sink.moves().collect();
    assert!(moves.len() >= 10);
    let (last_x, _) = *moves.last().expect("cursor moved");
    assert!(last_x > 960);
    assert_eq!(h.session.state(), SessionState::YChangingSizeChanging);
}

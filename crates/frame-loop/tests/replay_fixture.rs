use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use handpad_common::clock::SessionClock;
use handpad_frame_loop::writer::parse_session_events;
use handpad_frame_loop::{
    frame_slot, produce, FrameLoop, ReplaySource, SessionEvent, SessionEventWriter,
    SessionLogHeader,
};
use handpad_gesture_core::{FrameOutcome, Session, SessionConfig, SessionState};
use handpad_hand_model::event::GestureEvent;
use handpad_platform_core::{
    CursorSink, HandPoseSource, PolygonSurface, RecordingSink, ScreenBounds,
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/tap-and-move.jsonl")
}

fn load() -> ReplaySource {
    ReplaySource::from_path(&fixture_path()).expect("fixture loads")
}

fn frame_loop(source: &ReplaySource) -> FrameLoop<PolygonSurface, RecordingSink> {
    let (width, height) = source.frame_size((640, 480));
    let session = Session::new(
        SessionConfig::default(),
        width,
        height,
        ScreenBounds::new(1920, 1080),
    )
    .expect("default config is valid");
    let surface = source.surface((width, height)).expect("fixture surface");
    FrameLoop::new(
        session,
        surface,
        RecordingSink::new(),
        Duration::from_millis(100),
    )
}

#[test]
fn fixture_replay_taps_then_moves() {
    let mut source = load();
    assert_eq!(source.total(), 34);
    assert_eq!(source.fps(60), 30);

    let mut frame_loop = frame_loop(&source);
    let clock = SessionClock::start();
    let mut outcomes: Vec<FrameOutcome> = Vec::new();
    while let Some(frame) = source.capture(&clock).expect("replay capture") {
        outcomes.push(frame_loop.process(&frame).expect("frame processed"));
    }

    let gestures: Vec<GestureEvent> = outcomes.iter().filter_map(|o| o.gesture).collect();
    assert_eq!(gestures, vec![GestureEvent::IndexClick]);

    assert!(outcomes[..9]
        .iter()
        .all(|o| o.state == SessionState::Initializing));
    assert!(outcomes[9..12]
        .iter()
        .all(|o| o.state == SessionState::HandAtRest));
    assert!(outcomes.iter().all(|o| o.hand.is_some() || !o.on_surface));

    let sink = frame_loop.sink();
    assert_eq!(sink.actions().count(), 1);
    assert!(sink.moves().count() >= 3);
    let (x, _) = sink.position().expect("cursor placed");
    assert!(x > 960);

    assert_eq!(frame_loop.session().state(), SessionState::Initializing);
    assert_eq!(frame_loop.stats().frames_processed, 34);
    assert_eq!(frame_loop.stats().gestures, 1);
}

#[test]
fn fixture_replay_writes_session_log() {
    let dir = std::env::temp_dir().join("handpad_test_fixture_log");
    let _ = std::fs::remove_dir_all(&dir);
    let path = dir.join("events.jsonl");

    let mut source = load();
    let header = SessionLogHeader {
        schema_version: SessionLogHeader::SCHEMA_VERSION.to_string(),
        epoch_wall: "2026-01-01T00:00:00Z".to_string(),
        frame_width: 640,
        frame_height: 480,
        screen_width: 1920,
        screen_height: 1080,
    };
    let writer = SessionEventWriter::new(path.clone(), &header).expect("log created");
    let mut frame_loop = frame_loop(&source).with_event_writer(writer);

    let clock = SessionClock::start();
    while let Some(frame) = source.capture(&clock).expect("replay capture") {
        frame_loop.process(&frame).expect("frame processed");
    }
    drop(frame_loop);

    let events = parse_session_events(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let clicks: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                SessionEvent::Gesture {
                    gesture: GestureEvent::IndexClick,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(clicks.len(), 1);
    assert!(matches!(
        events.last(),
        Some(SessionEvent::State {
            state: SessionState::Initializing,
            ..
        })
    ));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn produced_frames_are_processed_or_dropped() {
    let source = load();
    let total = source.total() as u64;
    let mut frame_loop = frame_loop(&source);

    let (publisher, subscriber) = frame_slot();
    let stop = Arc::new(AtomicBool::new(false));
    let producer = tokio::spawn(produce(
        source,
        publisher,
        SessionClock::start(),
        120,
        stop.clone(),
    ));

    let stats = frame_loop.run(subscriber).await.expect("loop runs");
    let produced = producer.await.expect("producer joins").expect("producer ok");

    assert_eq!(produced, total);
    assert_eq!(stats.frames_processed + stats.frames_dropped, total);
    assert!(stats.frames_processed > 0);
}

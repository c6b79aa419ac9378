//! Replay a recorded frame stream through the gesture core.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

use handpad_common::clock::SessionClock;
use handpad_common::config::AppConfig;
use handpad_frame_loop::{
    frame_slot, produce, FrameLoop, LoopStats, ReplaySource, SessionEventWriter, SessionLogHeader,
};
use handpad_gesture_core::{FrameOutcome, Session};
use handpad_platform_core::{
    CursorSink, HandPoseSource, PolygonSurface, RecordingSink, ScreenBounds,
};

use super::load_tuning;

pub struct ReplayOptions {
    pub frames: PathBuf,
    pub events: Option<PathBuf>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub tuning: Option<PathBuf>,
    pub realtime: bool,
}

pub async fn run(app: &AppConfig, options: ReplayOptions) -> anyhow::Result<()> {
    println!("Replaying frames from: {}", options.frames.display());

    let mut source = ReplaySource::from_path(&options.frames)
        .map_err(|e| anyhow::anyhow!("Failed to load frames: {e}"))?;
    let (frame_width, frame_height) =
        source.frame_size((app.capture.frame_width, app.capture.frame_height));
    let fps = source.fps(app.capture.fps);
    let surface = source.surface((frame_width, frame_height))?;
    let screen = ScreenBounds::new(
        options.screen_width.unwrap_or(app.screen.width),
        options.screen_height.unwrap_or(app.screen.height),
    );

    println!("  Frames: {}", source.total());
    println!("  Camera: {frame_width}x{frame_height} @ {fps}fps");
    println!("  Screen: {}x{}", screen.width, screen.height);

    let tuning = load_tuning(app, options.tuning.as_deref())?;
    let session = Session::new(tuning, frame_width, frame_height, screen)?;
    let mut frame_loop = FrameLoop::new(
        session,
        surface,
        RecordingSink::new(),
        Duration::from_millis(app.capture.frame_timeout_ms),
    );

    if let Some(path) = options.events.as_ref() {
        let clock = SessionClock::start();
        let header = SessionLogHeader {
            schema_version: SessionLogHeader::SCHEMA_VERSION.to_string(),
            epoch_wall: clock.epoch_wall().to_string(),
            frame_width,
            frame_height,
            screen_width: screen.width,
            screen_height: screen.height,
        };
        let writer = SessionEventWriter::new(path.clone(), &header)?;
        frame_loop = frame_loop.with_event_writer(writer);
        println!("  Events: {}", path.display());
    }
    println!();

    let mut report = Report::default();
    let stats = if options.realtime {
        run_paced(&mut frame_loop, source, fps, &mut report).await?
    } else {
        let clock = SessionClock::start();
        while let Some(frame) = source.capture(&clock)? {
            let outcome = frame_loop.process(&frame)?;
            report.observe(&outcome);
        }
        frame_loop.stats()
    };

    report.print(&stats, frame_loop.sink().position());
    Ok(())
}

async fn run_paced(
    frame_loop: &mut FrameLoop<PolygonSurface, RecordingSink>,
    source: ReplaySource,
    fps: u32,
    report: &mut Report,
) -> anyhow::Result<LoopStats> {
    let stop = frame_loop.stop_flag();
    let (publisher, subscriber) = frame_slot();

    let interrupt = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.store(true, Ordering::SeqCst);
        }
    });

    let producer = tokio::spawn(produce(
        source,
        publisher,
        SessionClock::start(),
        fps,
        stop,
    ));

    let stats = frame_loop
        .run_with(subscriber, |outcome, stale| {
            if !stale {
                report.observe(outcome);
            }
        })
        .await?;

    let produced = producer
        .await
        .map_err(|e| anyhow::anyhow!("Frame producer failed: {e}"))??;
    tracing::debug!(produced, "Producer joined");
    Ok(stats)
}

/// What the replay printed and counted.
#[derive(Default)]
struct Report {
    gestures: BTreeMap<&'static str, usize>,
}

impl Report {
    fn observe(&mut self, outcome: &FrameOutcome) {
        let secs = SessionClock::ns_to_secs(outcome.timestamp_ns);
        if outcome.state_changed {
            println!("  {secs:>8.3}s  state    {}", outcome.state);
        }
        if let Some(gesture) = outcome.gesture {
            println!("  {secs:>8.3}s  gesture  {gesture}");
            *self.gestures.entry(gesture.name()).or_insert(0) += 1;
        }
    }

    fn print(&self, stats: &LoopStats, cursor: Option<(i32, i32)>) {
        println!();
        println!("Summary:");
        println!("  Frames processed: {}", stats.frames_processed);
        println!("  Frames dropped: {}", stats.frames_dropped);
        println!("  Stale cycles: {}", stats.stale_cycles);
        println!("  State changes: {}", stats.state_changes);
        println!("  Gestures: {}", stats.gestures);
        for (name, count) in &self.gestures {
            println!("    {name}: {count}");
        }
        match cursor {
            Some((x, y)) => println!("  Final cursor: ({x}, {y})"),
            None => println!("  Final cursor: never moved"),
        }
    }
}

//! Synthesize gesture scenarios as hand frame streams.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use handpad_common::clock::SessionClock;
use handpad_common::config::AppConfig;
use handpad_frame_loop::FrameLoop;
use handpad_gesture_core::Session;
use handpad_hand_model::frame::{serialize_frames, FrameStreamHeader, HandFrame};
use handpad_hand_model::geometry::Point2D;
use handpad_hand_model::landmarks::Finger;
use handpad_hand_model::synthetic::SyntheticHand;
use handpad_platform_core::{PolygonSurface, RecordingSink, ScreenBounds};

use super::load_tuning;

const FRAME_WIDTH: u32 = 640;
const FRAME_HEIGHT: u32 = 480;
const FPS: u32 = 30;
/// Resting frames before the scenario starts, enough for the state to settle.
const LEAD_IN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Hand resting still
    Rest,
    /// Index taps at a steady rhythm
    Tap,
    /// Index and middle dragged up together, repeatedly
    Scroll,
    /// Hand sliding left and right
    Move,
    /// A fast sideways flick, then still
    Swipe,
}

pub fn run(
    app: &AppConfig,
    scenario: Scenario,
    frames: usize,
    output: Option<PathBuf>,
    tuning: Option<PathBuf>,
) -> anyhow::Result<()> {
    let stream = synthesize(scenario, frames);
    let header = FrameStreamHeader::new(FRAME_WIDTH, FRAME_HEIGHT, FPS);

    if let Some(path) = output {
        let jsonl = serialize_frames(&header, &stream)?;
        std::fs::write(&path, jsonl)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
        println!(
            "Wrote {} {:?} frames to {}",
            stream.len(),
            scenario,
            path.display()
        );
        return Ok(());
    }

    let tuning = load_tuning(app, tuning.as_deref())?;
    let screen = ScreenBounds::new(app.screen.width, app.screen.height);
    let session = Session::new(tuning, FRAME_WIDTH, FRAME_HEIGHT, screen)?;
    let surface = PolygonSurface::full_frame(FRAME_WIDTH, FRAME_HEIGHT)?.locked();
    let mut frame_loop = FrameLoop::new(
        session,
        surface,
        RecordingSink::new(),
        Duration::from_millis(app.capture.frame_timeout_ms),
    );

    for frame in &stream {
        let outcome = frame_loop.process(frame)?;
        println!("{}", serde_json::to_string(&outcome)?);
    }

    let stats = frame_loop.stats();
    tracing::info!(
        frames = stats.frames_processed,
        gestures = stats.gestures,
        state_changes = stats.state_changes,
        "Simulation finished"
    );
    Ok(())
}

/// Build `frames` frames for `scenario` at [`FPS`].
pub fn synthesize(scenario: Scenario, frames: usize) -> Vec<HandFrame> {
    let mut hand = SyntheticHand::new(FRAME_WIDTH, FRAME_HEIGHT, Point2D::new(320.0, 300.0));
    let interval_ns = SessionClock::secs_to_ns(1.0 / FPS as f64);

    (0..frames)
        .map(|i| {
            if i >= LEAD_IN {
                pose(&mut hand, scenario, i - LEAD_IN);
            }
            HandFrame::with_hand(i as u64 * interval_ns, hand.landmarks())
        })
        .collect()
}

/// Advance `hand` to step `step` of the scenario.
fn pose(hand: &mut SyntheticHand, scenario: Scenario, step: usize) {
    match scenario {
        Scenario::Rest => {}
        Scenario::Tap => {
            hand.relax();
            if step % 20 == 0 {
                hand.shift_tip(Finger::Index, 0.0, 30.0);
            }
        }
        Scenario::Scroll => {
            let phase = step % 12;
            if phase < 6 {
                let dy = -6.0 * (phase + 1) as f64;
                hand.shift_tip(Finger::Index, 0.0, dy)
                    .shift_tip(Finger::Middle, 0.0, dy);
            } else {
                hand.relax();
            }
        }
        Scenario::Move => {
            let dx = if (step / 30) % 2 == 0 { 4.0 } else { -4.0 };
            hand.translate(dx, 0.0);
        }
        Scenario::Swipe => {
            if step < 4 {
                hand.translate(20.0, 0.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesize_frame_count_and_timing() {
        let frames = synthesize(Scenario::Rest, 5);
        assert_eq!(frames.len(), 5);
        assert_eq!(frames[0].timestamp_ns, 0);
        assert!(frames.windows(2).all(|w| w[1].timestamp_ns > w[0].timestamp_ns));
        assert!(frames.iter().all(|f| f.hand.is_some() && f.surface_locked));
    }

    #[test]
    fn test_swipe_moves_then_stops() {
        let frames = synthesize(Scenario::Swipe, LEAD_IN + 8);
        let x = |i: usize| frames[i].hand.as_ref().unwrap().center_px(FRAME_WIDTH, FRAME_HEIGHT).x;
        assert!((x(LEAD_IN) - x(LEAD_IN - 1) - 20.0).abs() < 1e-6);
        assert!((x(LEAD_IN + 7) - x(LEAD_IN + 6)).abs() < 1e-6);
    }
}

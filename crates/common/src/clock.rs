//! Clock and frame pacing utilities.
//!
//! Every Handpad frame is stamped with monotonic nanoseconds relative to
//! the moment the session clock started. Gestures that depend on wall
//! time (double tap, press-and-hold) read these stamps rather than
//! counting frames, so they stay correct when the camera rate varies.

use std::time::Instant;

/// A session clock that provides monotonic timestamps relative to a
/// fixed epoch (the moment tracking started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Nanoseconds elapsed since the clock started.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Seconds elapsed since the clock started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at clock start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert a nanosecond stamp to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }

    /// Convert seconds to nanoseconds.
    pub fn secs_to_ns(secs: f64) -> u64 {
        (secs.max(0.0) * 1_000_000_000.0) as u64
    }
}

/// Gate that lets a producer emit frames at a target rate.
#[derive(Debug)]
pub struct FramePacer {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
    overruns: u64,
}

impl FramePacer {
    /// Create a pacer targeting the given frame rate.
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_interval_ns: 1_000_000_000 / target_fps.max(1) as u64,
            last_tick_ns: None,
            overruns: 0,
        }
    }

    /// Check if enough time has passed for the next frame.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                // A gap of two or more intervals means at least one frame
                // slot was missed.
                if current_ns >= last + 2 * self.target_interval_ns {
                    self.overruns += 1;
                }
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }

    /// Target interval in nanoseconds.
    pub fn interval_ns(&self) -> u64 {
        self.target_interval_ns
    }

    /// Number of ticks that arrived a full interval or more late.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

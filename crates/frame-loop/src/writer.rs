//! Append-only session event log.
//!
//! Fired gestures and effective state changes are written as JSONL after
//! a `#`-prefixed header line, one event per line.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use handpad_common::error::{HandpadError, HandpadResult};
use handpad_gesture_core::{FrameOutcome, SessionState};
use handpad_hand_model::event::GestureEvent;
use handpad_hand_model::frame::TimestampNs;

/// Metadata written as the first line of a session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogHeader {
    pub schema_version: String,
    /// Wall-clock time at session start (RFC 3339).
    pub epoch_wall: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl SessionLogHeader {
    pub const SCHEMA_VERSION: &'static str = "1.0";
}

/// One line of the session log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    Gesture { t: TimestampNs, gesture: GestureEvent },
    State { t: TimestampNs, state: SessionState },
}

impl SessionEvent {
    /// Events worth logging from one frame outcome, state change first.
    pub fn from_outcome(outcome: &FrameOutcome) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if outcome.state_changed {
            events.push(SessionEvent::State {
                t: outcome.timestamp_ns,
                state: outcome.state,
            });
        }
        if let Some(gesture) = outcome.gesture {
            events.push(SessionEvent::Gesture {
                t: outcome.timestamp_ns,
                gesture,
            });
        }
        events
    }
}

/// Writes session events to a JSONL file.
pub struct SessionEventWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    events_written: u64,
}

impl SessionEventWriter {
    /// Create the log, writing the header as the first line.
    pub fn new(path: PathBuf, header: &SessionLogHeader) -> HandpadResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| HandpadError::processing(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path,
            events_written: 0,
        })
    }

    pub fn write_event(&mut self, event: &SessionEvent) -> HandpadResult<()> {
        let json = serde_json::to_string(event)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| HandpadError::processing(format!("Failed to write event: {e}")))?;
        self.events_written += 1;

        if self.events_written % 100 == 0 {
            self.flush()?;
        }
        Ok(())
    }

    /// Log whatever a frame outcome carries. Returns the number of lines written.
    pub fn write_outcome(&mut self, outcome: &FrameOutcome) -> HandpadResult<usize> {
        let events = SessionEvent::from_outcome(outcome);
        for event in &events {
            self.write_event(event)?;
        }
        Ok(events.len())
    }

    pub fn flush(&mut self) -> HandpadResult<()> {
        self.writer
            .flush()
            .map_err(|e| HandpadError::processing(format!("Failed to flush events: {e}")))
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionEventWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Parse the event lines of a session log, skipping the header.
pub fn parse_session_events(jsonl: &str) -> Result<Vec<SessionEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

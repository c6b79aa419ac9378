//! Cursor sink contract and in-process sinks.
//!
//! The gesture core emits logical [`GestureEvent`]s; [`dispatch_gesture`]
//! maps each one onto the sink's primitive actions. Sinks are assumed
//! synchronous and always available.

use serde::{Deserialize, Serialize};

use handpad_hand_model::event::{GestureEvent, MouseButton, ScrollDirection};

/// OS cursor injection backend.
pub trait CursorSink {
    /// Move the cursor to an absolute screen position.
    fn move_to(&mut self, x: i32, y: i32);

    fn click(&mut self, button: MouseButton);

    fn double_click(&mut self);

    /// Press the primary button without releasing it.
    fn mouse_down(&mut self);

    /// Release the primary button.
    fn mouse_up(&mut self);

    fn scroll(&mut self, direction: ScrollDirection);

    /// Gestures with no single mouse primitive (zoom, rotate, swipe).
    fn gesture(&mut self, event: &GestureEvent) {
        tracing::debug!(gesture = %event, "Sink ignores gesture");
    }

    /// Current cursor position, when the backend can report it.
    fn position(&self) -> Option<(i32, i32)> {
        None
    }

    /// Sink name for logging.
    fn name(&self) -> &str;
}

/// Route a gesture event to the matching sink action.
pub fn dispatch_gesture(sink: &mut dyn CursorSink, event: &GestureEvent) {
    match event {
        GestureEvent::IndexClick => sink.click(MouseButton::Left),
        GestureEvent::MiddleClick => sink.click(MouseButton::Middle),
        GestureEvent::TwoFingerClick => sink.click(MouseButton::Right),
        GestureEvent::DoubleTap => sink.double_click(),
        GestureEvent::HoldStarted => sink.mouse_down(),
        GestureEvent::HoldReleased => sink.mouse_up(),
        GestureEvent::Scroll { direction } => sink.scroll(*direction),
        GestureEvent::Zoom { .. } | GestureEvent::Rotate { .. } | GestureEvent::Swipe { .. } => {
            sink.gesture(event)
        }
    }
}

/// One primitive action performed on a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SinkCommand {
    MoveTo { x: i32, y: i32 },
    Click { button: MouseButton },
    DoubleClick,
    MouseDown,
    MouseUp,
    Scroll { direction: ScrollDirection },
    Gesture { event: GestureEvent },
}

/// Sink that records every command in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    commands: Vec<SinkCommand>,
    position: Option<(i32, i32)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a known cursor position.
    pub fn with_position(x: i32, y: i32) -> Self {
        Self {
            commands: Vec::new(),
            position: Some((x, y)),
        }
    }

    pub fn commands(&self) -> &[SinkCommand] {
        &self.commands
    }

    /// Every absolute position the cursor was moved to, in order.
    pub fn moves(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.commands.iter().filter_map(|cmd| match cmd {
            SinkCommand::MoveTo { x, y } => Some((*x, *y)),
            _ => None,
        })
    }

    /// Commands other than cursor moves.
    pub fn actions(&self) -> impl Iterator<Item = &SinkCommand> + '_ {
        self.commands
            .iter()
            .filter(|cmd| !matches!(cmd, SinkCommand::MoveTo { .. }))
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl CursorSink for RecordingSink {
    fn move_to(&mut self, x: i32, y: i32) {
        self.position = Some((x, y));
        self.commands.push(SinkCommand::MoveTo { x, y });
    }

    fn click(&mut self, button: MouseButton) {
        self.commands.push(SinkCommand::Click { button });
    }

    fn double_click(&mut self) {
        self.commands.push(SinkCommand::DoubleClick);
    }

    fn mouse_down(&mut self) {
        self.commands.push(SinkCommand::MouseDown);
    }

    fn mouse_up(&mut self) {
        self.commands.push(SinkCommand::MouseUp);
    }

    fn scroll(&mut self, direction: ScrollDirection) {
        self.commands.push(SinkCommand::Scroll { direction });
    }

    fn gesture(&mut self, event: &GestureEvent) {
        self.commands.push(SinkCommand::Gesture { event: *event });
    }

    fn position(&self) -> Option<(i32, i32)> {
        self.position
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Sink that only logs what it would have done.
#[derive(Debug, Default, Clone)]
pub struct TracingSink {
    position: Option<(i32, i32)>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CursorSink for TracingSink {
    fn move_to(&mut self, x: i32, y: i32) {
        self.position = Some((x, y));
        tracing::trace!(x, y, "Cursor move");
    }

    fn click(&mut self, button: MouseButton) {
        tracing::info!(?button, "Click");
    }

    fn double_click(&mut self) {
        tracing::info!("Double click");
    }

    fn mouse_down(&mut self) {
        tracing::info!("Mouse down");
    }

    fn mouse_up(&mut self) {
        tracing::info!("Mouse up");
    }

    fn scroll(&mut self, direction: ScrollDirection) {
        tracing::info!(?direction, "Scroll");
    }

    fn gesture(&mut self, event: &GestureEvent) {
        tracing::info!(gesture = %event, "Gesture");
    }

    fn position(&self) -> Option<(i32, i32)> {
        self.position
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

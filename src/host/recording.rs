use crate::host::{HostError, InputDriver, Key, MouseButton};
use crate::models::Point;
use std::collections::BTreeSet;

/// One dispatched input command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    Move(Point),
    Click(MouseButton),
}

/// Input driver that records commands instead of sending them.
///
/// Used by the dry-run binary to show what a run would do, and by tests to
/// assert on the exact command sequence.
#[derive(Debug, Default)]
pub struct RecordingInput {
    events: Vec<InputEvent>,
    cursor: Point,
}

impl RecordingInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(cursor: Point) -> Self {
        Self {
            events: Vec::new(),
            cursor,
        }
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clicks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, InputEvent::Click(_)))
            .count()
    }

    /// Keys that were pressed and not released since recording started
    pub fn held_keys(&self) -> BTreeSet<Key> {
        let mut held = BTreeSet::new();
        for event in &self.events {
            match event {
                InputEvent::KeyDown(key) => {
                    held.insert(*key);
                }
                InputEvent::KeyUp(key) => {
                    held.remove(key);
                }
                _ => {}
            }
        }
        held
    }
}

impl InputDriver for RecordingInput {
    fn key_down(&mut self, key: Key) -> Result<(), HostError> {
        tracing::debug!("Dry run: key down {:?}", key);
        self.events.push(InputEvent::KeyDown(key));
        Ok(())
    }

    fn key_up(&mut self, key: Key) -> Result<(), HostError> {
        tracing::trace!("Dry run: key up {:?}", key);
        self.events.push(InputEvent::KeyUp(key));
        Ok(())
    }

    fn move_cursor(&mut self, position: Point) -> Result<(), HostError> {
        tracing::debug!("Dry run: move cursor to {}", position);
        self.cursor = position;
        self.events.push(InputEvent::Move(position));
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), HostError> {
        tracing::debug!("Dry run: {:?} click at {}", button, self.cursor);
        self.events.push(InputEvent::Click(button));
        Ok(())
    }

    fn cursor_position(&self) -> Point {
        self.cursor
    }
}

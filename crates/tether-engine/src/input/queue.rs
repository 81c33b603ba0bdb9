use glam::Vec2;

use crate::api::types::PointerId;

/// Pointer events the sandbox understands, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A touch/click began.
    PointerDown { id: PointerId, pos: Vec2 },
    /// A touch/cursor moved.
    PointerMove { id: PointerId, pos: Vec2 },
    /// A touch/click ended.
    PointerUp { id: PointerId },
}

impl InputEvent {
    pub fn pointer(&self) -> PointerId {
        match *self {
            InputEvent::PointerDown { id, .. }
            | InputEvent::PointerMove { id, .. }
            | InputEvent::PointerUp { id } => id,
        }
    }
}

/// A queue of input events.
/// The host writes events as they arrive; the frame loop drains them once
/// per frame, before stepping.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events in arrival order.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

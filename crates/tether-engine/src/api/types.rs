use serde::{Deserialize, Serialize};

/// Identifies one input source. The mouse proxy lives for the whole session;
/// each touch gets its own proxy from press until release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointerId {
    Mouse,
    Touch(u32),
}

impl PointerId {
    /// Decode the host-side integer id: negative values mean the mouse.
    pub fn from_raw(raw: i32) -> Self {
        if raw < 0 {
            PointerId::Mouse
        } else {
            PointerId::Touch(raw as u32)
        }
    }

    pub fn is_touch(self) -> bool {
        matches!(self, PointerId::Touch(_))
    }
}

/// Opaque 32-bit identity of a shape, stable for the shape's lifetime.
/// Only used to derive a reproducible debug color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ShapeId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_pointer_ids() {
        assert_eq!(PointerId::from_raw(-1), PointerId::Mouse);
        assert_eq!(PointerId::from_raw(3), PointerId::Touch(3));
        assert!(PointerId::Touch(0).is_touch());
        assert!(!PointerId::Mouse.is_touch());
    }
}

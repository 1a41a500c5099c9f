//! Common input types shared by the robot and the component model

use serde::{Deserialize, Serialize};

/// Mouse buttons recognized by the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// A keyboard key, identified by its key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(pub u32);

impl Key {
    pub const TAB: Key = Key(9);
    pub const ENTER: Key = Key(10);
    pub const ESCAPE: Key = Key(27);
    pub const SPACE: Key = Key(32);
}

/// A simulated low-level input event, delivered to component input listeners
/// on the event loop thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    MousePressed { button: MouseButton, clicks: u32 },
    MouseReleased { button: MouseButton },
    MouseMoved { x: i32, y: i32 },
    KeyPressed { key: Key },
    KeyReleased { key: Key },
}

impl InputEvent {
    /// Whether this event conventionally opens a context/popup menu.
    pub fn is_popup_trigger(&self) -> bool {
        matches!(
            self,
            InputEvent::MousePressed {
                button: MouseButton::Right,
                ..
            }
        )
    }
}

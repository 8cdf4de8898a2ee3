use serde::{Deserialize, Serialize};

/// Mouse buttons understood by the remote HID injector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Left,
    Right,
}

impl MouseButton {
    /// Maps a native pointer button code to a protocol button.
    /// Only the primary (0) and secondary (2) buttons are forwarded;
    /// everything else is dropped by the caller.
    pub fn from_native(code: u8) -> Option<Self> {
        match code {
            0 => Some(MouseButton::Left),
            2 => Some(MouseButton::Right),
            _ => None,
        }
    }
}

/// An absolute position in the injector's fixed 16-bit signed space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidPosition {
    pub x: i16,
    pub y: i16,
}

/// Raw wheel deltas as reported by the front-end, in native units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelDelta {
    pub x: f64,
    pub y: f64,
}

/// One protocol message. Serializes to a single JSON object tagged with
/// `event_type`; the injector never replies, the stream is one-way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum MouseEvent {
    MouseMove { to: HidPosition },
    MouseButton { button: MouseButton, state: bool },
    MouseWheel { delta: WheelDelta },
}

impl MouseEvent {
    pub fn move_to(to: HidPosition) -> Self {
        MouseEvent::MouseMove { to }
    }

    pub fn button(button: MouseButton, state: bool) -> Self {
        MouseEvent::MouseButton { button, state }
    }

    pub fn wheel(x: f64, y: f64) -> Self {
        MouseEvent::MouseWheel {
            delta: WheelDelta { x, y },
        }
    }

    /// Encodes the event as one newline-terminated JSON line, the framing
    /// used on the wire.
    pub fn to_wire_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buf = serde_json::to_vec(self)?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Decodes a single frame (with or without the trailing newline).
    pub fn from_wire_line(line: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line)
    }
}

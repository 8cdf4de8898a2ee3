use std::sync::Arc;

use shared::{HidPosition, MouseButton, MouseEvent};

use crate::channel::EventChannel;
use crate::normalize::to_hid;

/// Pixel coordinates relative to the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelPosition {
    pub x: i32,
    pub y: i32,
}

/// Displayed size of the viewport. Re-read on every flush because the
/// rendered element can resize between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: i32,
    pub height: i32,
}

/// Raw interactions delivered by a UI adapter. The forwarder depends only
/// on this surface, not on any particular toolkit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportInput {
    Motion { x: i32, y: i32 },
    Button { code: u8, pressed: bool },
    Wheel { dx: f64, dy: f64 },
    /// First contact point only; further touches are ignored by adapters.
    TouchStart { x: i32, y: i32 },
    TouchEnd,
    PointerEnter,
    PointerLeave,
}

/// Tells the UI adapter whether to suppress the native default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Consume,
    Pass,
}

/// State surfaced to the external capture indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// Pointer inside the viewport while a channel is attached.
    Tracked,
    Free,
}

/// Tracks {connected} x {hovered} for the indicator. Observational only,
/// never produces protocol traffic.
pub struct HoverTracker {
    connected: bool,
    hovered: bool,
    indicator: Box<dyn Fn(IndicatorState) + Send>,
}

impl HoverTracker {
    fn new(indicator: Box<dyn Fn(IndicatorState) + Send>) -> Self {
        Self {
            connected: false,
            hovered: false,
            indicator,
        }
    }

    fn set_hovered(&mut self, hovered: bool) {
        self.hovered = hovered;
        self.publish();
    }

    fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        self.publish();
    }

    pub fn state(&self) -> IndicatorState {
        if self.connected && self.hovered {
            IndicatorState::Tracked
        } else {
            IndicatorState::Free
        }
    }

    fn publish(&self) {
        (self.indicator)(self.state());
    }
}

/// Owns all pointer-forwarding state for one viewport: the latest sampled
/// position, the last position put on the wire, the hover tracker and the
/// optional channel. Created once at UI start-up and kept for the session.
pub struct MouseForwarder {
    viewport: ViewportSize,
    current: PixelPosition,
    sent: PixelPosition,
    hover: HoverTracker,
    channel: Option<Arc<dyn EventChannel>>,
}

impl MouseForwarder {
    pub fn new(
        viewport: ViewportSize,
        indicator: impl Fn(IndicatorState) + Send + 'static,
    ) -> Self {
        Self {
            viewport,
            current: PixelPosition::default(),
            sent: PixelPosition::default(),
            hover: HoverTracker::new(Box::new(indicator)),
            channel: None,
        }
    }

    /// Called by the UI adapter whenever the rendered element resizes.
    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
    }

    /// Attaching a channel marks the forwarder online; detaching returns it
    /// to the silent offline mode. Both re-evaluate the indicator.
    pub fn set_channel(&mut self, channel: Option<Arc<dyn EventChannel>>) {
        self.hover.set_connected(channel.is_some());
        self.channel = channel;
    }

    pub fn indicator_state(&self) -> IndicatorState {
        self.hover.state()
    }

    /// Entry point for everything the UI adapter captures. Runs to
    /// completion, never blocks.
    pub fn handle(&mut self, input: ViewportInput) -> Handled {
        match input {
            ViewportInput::Motion { x, y } => {
                // Motion only records the sample; the ticker decides when
                // it goes on the wire.
                self.current = PixelPosition { x, y };
                Handled::Pass
            }
            ViewportInput::Button { code, pressed } => {
                let Some(button) = MouseButton::from_native(code) else {
                    return Handled::Pass;
                };
                self.flush_moves();
                self.send(&MouseEvent::button(button, pressed));
                Handled::Consume
            }
            ViewportInput::TouchStart { x, y } => {
                // A touch is "move there, then press". Touch always reports
                // the primary button.
                self.current = PixelPosition { x, y };
                self.flush_moves();
                self.send(&MouseEvent::button(MouseButton::Left, true));
                Handled::Consume
            }
            ViewportInput::TouchEnd => {
                self.send(&MouseEvent::button(MouseButton::Left, false));
                Handled::Consume
            }
            ViewportInput::Wheel { dx, dy } => {
                // Wheel is never throttled and never waits for a flush.
                self.send(&MouseEvent::wheel(dx, dy));
                Handled::Consume
            }
            ViewportInput::PointerEnter => {
                self.hover.set_hovered(true);
                Handled::Pass
            }
            ViewportInput::PointerLeave => {
                self.hover.set_hovered(false);
                Handled::Pass
            }
        }
    }

    /// Sends the current position if it differs from the last one sent.
    /// Invoked on every ticker period, and out of band before button and
    /// touch presses so the remote cursor lands before the click does.
    pub fn flush_moves(&mut self) {
        if self.current == self.sent {
            return;
        }
        let Some(to) = self.normalized() else {
            // Viewport has no size yet; hold the position for a later flush.
            return;
        };
        self.send(&MouseEvent::move_to(to));
        self.sent = self.current;
    }

    fn normalized(&self) -> Option<HidPosition> {
        if self.viewport.width <= 0 || self.viewport.height <= 0 {
            return None;
        }
        Some(HidPosition {
            x: to_hid(self.current.x, self.viewport.width),
            y: to_hid(self.current.y, self.viewport.height),
        })
    }

    fn send(&self, event: &MouseEvent) {
        // No channel means offline; dropping the event is the contract.
        if let Some(channel) = &self.channel {
            channel.send(event);
        }
    }
}

use std::error::Error;

use rdev::EventType;
use shared::{HidPosition, MouseButton, MouseEvent};
use tracing::info;

use crate::simulator::EventSimulator;

#[cfg(target_os = "linux")]
use std::sync::Mutex;
#[cfg(target_os = "linux")]
use tracing::warn;

/// Applies decoded events to the local desktop. Moves go to an absolute
/// uinput tablet device when one can be created (Linux); everywhere else,
/// and for buttons and wheel always, events are replayed through the
/// queued rdev simulator.
pub(crate) struct Injector {
    simulator: EventSimulator,
    display: (f64, f64),
    #[cfg(target_os = "linux")]
    tablet: Mutex<Option<uinput::Device>>,
}

impl Injector {
    pub fn new() -> Result<Self, Box<dyn Error + Send + Sync + 'static>> {
        let (width, height) =
            rdev::display_size().map_err(|e| format!("failed to read display size: {e:?}"))?;

        #[cfg(target_os = "linux")]
        let tablet = match create_tablet() {
            Ok(device) => {
                info!("created uinput tablet device");
                Some(device)
            }
            Err(err) => {
                warn!("uinput unavailable ({err}); falling back to cursor simulation");
                None
            }
        };

        info!("injecting into {width}x{height} display");
        Ok(Self {
            simulator: EventSimulator::new(),
            display: (width as f64, height as f64),
            #[cfg(target_os = "linux")]
            tablet: Mutex::new(tablet),
        })
    }

    pub fn apply(&self, event: MouseEvent) {
        match event {
            MouseEvent::MouseMove { to } => self.move_to(to),
            MouseEvent::MouseButton { button, state } => {
                self.simulator.enqueue(button_event(button, state));
            }
            MouseEvent::MouseWheel { delta } => {
                self.simulator.enqueue(EventType::Wheel {
                    delta_x: delta.x.round() as i64,
                    delta_y: delta.y.round() as i64,
                });
            }
        }
    }

    fn move_to(&self, to: HidPosition) {
        #[cfg(target_os = "linux")]
        {
            let mut tablet = self.tablet.lock().expect("tablet mutex poisoned");
            if let Some(device) = tablet.as_mut() {
                match emit_absolute(device, to) {
                    Ok(()) => return,
                    Err(err) => {
                        warn!("failed to emit tablet position ({err}); disabling device");
                        *tablet = None;
                    }
                }
            }
        }

        self.simulator.enqueue(EventType::MouseMove {
            x: to_display(to.x, self.display.0),
            y: to_display(to.y, self.display.1),
        });
    }
}

/// Maps the 16-bit absolute range back onto one axis of the display.
fn to_display(value: i16, extent: f64) -> f64 {
    (value as f64 + 32768.0) / 65535.0 * extent
}

fn button_event(button: MouseButton, state: bool) -> EventType {
    let button = match button {
        MouseButton::Left => rdev::Button::Left,
        MouseButton::Right => rdev::Button::Right,
    };
    if state {
        EventType::ButtonPress(button)
    } else {
        EventType::ButtonRelease(button)
    }
}

#[cfg(target_os = "linux")]
fn create_tablet() -> Result<uinput::Device, uinput::Error> {
    uinput::default()?
        .name("hidcast-tablet")?
        .event(uinput::event::absolute::Position::X)?
        .min(-32768)
        .max(32767)
        .event(uinput::event::absolute::Position::Y)?
        .min(-32768)
        .max(32767)
        .create()
}

#[cfg(target_os = "linux")]
fn emit_absolute(device: &mut uinput::Device, to: HidPosition) -> Result<(), uinput::Error> {
    device.position(&uinput::event::absolute::Position::X, to.x as i32)?;
    device.position(&uinput::event::absolute::Position::Y, to.y as i32)?;
    device.synchronize()?;
    Ok(())
}

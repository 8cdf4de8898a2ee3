use std::{
    env,
    error::Error,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use rdev::{Button, Event, EventType, listen};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use client::channel::QuicEventChannel;
use client::mouse::{MouseForwarder, ViewportInput, ViewportSize};
use client::quic;
use client::throttle::MoveTicker;

const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:4433";

fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr: SocketAddr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_SERVER_ADDR.into())
        .parse()?;

    // The demo adapter treats the primary display as the viewport.
    let (width, height) =
        rdev::display_size().map_err(|e| format!("failed to read display size: {e:?}"))?;
    let viewport = ViewportSize {
        width: width as i32,
        height: height as i32,
    };

    let (endpoint, connection) = quic::quic_runtime().block_on(quic::connect(addr))?;
    let channel = Arc::new(QuicEventChannel::spawn(connection.clone()));

    let forwarder = Arc::new(Mutex::new(MouseForwarder::new(viewport, |state| {
        debug!("indicator: {state:?}");
    })));
    forwarder
        .lock()
        .expect("pointer state mutex poisoned")
        .set_channel(Some(channel));
    let _ticker = MoveTicker::spawn(Arc::clone(&forwarder));

    info!(
        "forwarding pointer input to {addr} (viewport {}x{}); Ctrl+C to stop",
        viewport.width, viewport.height
    );

    let sampler = Arc::clone(&forwarder);
    listen(move |event: Event| {
        if let Some(input) = viewport_input(event.event_type) {
            sampler
                .lock()
                .expect("pointer state mutex poisoned")
                .handle(input);
        }
    })
    .map_err(|e| format!("failed to listen for input events: {e:?}"))?;

    quic::quic_runtime().block_on(quic::close_client(connection, endpoint))?;
    Ok(())
}

fn viewport_input(event: EventType) -> Option<ViewportInput> {
    match event {
        EventType::MouseMove { x, y } => Some(ViewportInput::Motion {
            x: x as i32,
            y: y as i32,
        }),
        EventType::ButtonPress(button) => native_code(button).map(|code| ViewportInput::Button {
            code,
            pressed: true,
        }),
        EventType::ButtonRelease(button) => native_code(button).map(|code| ViewportInput::Button {
            code,
            pressed: false,
        }),
        EventType::Wheel { delta_x, delta_y } => Some(ViewportInput::Wheel {
            dx: delta_x as f64,
            dy: delta_y as f64,
        }),
        _ => None,
    }
}

// Middle stays mapped to its native code so the sampler's own drop path is
// what discards it.
fn native_code(button: Button) -> Option<u8> {
    match button {
        Button::Left => Some(0),
        Button::Middle => Some(1),
        Button::Right => Some(2),
        Button::Unknown(_) => None,
    }
}

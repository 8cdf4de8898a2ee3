use std::sync::mpsc::{self, Sender};
use std::thread;

use rdev::{EventType, simulate};
use tracing::error;

/// Replays events on a dedicated thread so stream handlers never block on
/// the platform event queue.
pub(crate) struct EventSimulator {
    sender: Sender<EventType>,
}

impl EventSimulator {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel::<EventType>();

        thread::Builder::new()
            .name("event-simulator".into())
            .spawn(move || {
                for event in receiver {
                    if let Err(err) = simulate(&event) {
                        error!("failed to simulate event: {err:?}");
                    }
                }
            })
            .expect("failed to spawn event simulator thread");

        Self { sender }
    }

    pub fn enqueue(&self, event: EventType) {
        if let Err(err) = self.sender.send(event) {
            error!("failed to enqueue event for simulation: {err}");
        }
    }
}

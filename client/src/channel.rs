use std::thread;

use quinn::{Connection, SendStream};
use shared::MouseEvent;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::quic::{open_uni, quic_runtime};

/// One-way, fire-and-forget event sink. Implementations never block and
/// never surface failures to the caller; a lost event is lost.
pub trait EventChannel: Send + Sync {
    fn send(&self, event: &MouseEvent);
}

/// Forwards events over a QUIC unidirectional stream. Events are queued on
/// an unbounded mpsc and written by a dedicated worker, so submission order
/// is exactly wire order (which is what keeps moves ahead of the clicks
/// that flushed them).
pub struct QuicEventChannel {
    tx: UnboundedSender<MouseEvent>,
}

impl QuicEventChannel {
    /// Spawns the stream worker on its own thread so sends from UI
    /// callbacks never touch the networking runtime directly.
    pub fn spawn(connection: Connection) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = thread::spawn(move || run_event_worker(connection, rx));
        Self { tx }
    }
}

impl EventChannel for QuicEventChannel {
    fn send(&self, event: &MouseEvent) {
        if self.tx.send(event.clone()).is_err() {
            debug!("event worker gone; dropping {event:?}");
        }
    }
}

fn run_event_worker(connection: Connection, mut rx: UnboundedReceiver<MouseEvent>) {
    quic_runtime().block_on(async move {
        let mut stream = match open_uni(connection).await {
            Ok(stream) => Some(stream),
            Err(error) => {
                warn!("failed to open event stream: {error}");
                return;
            }
        };

        while let Some(event) = rx.recv().await {
            let Some(open) = stream.as_mut() else {
                // Stream already failed; keep draining so senders stay
                // cheap no-ops for the rest of the session.
                continue;
            };
            let line = match event.to_wire_line() {
                Ok(line) => line,
                Err(error) => {
                    warn!("failed to encode {event:?}: {error}");
                    continue;
                }
            };
            if let Err(error) = open.write_all(&line).await {
                warn!("failed to send event: {error}");
                stream = None;
            }
        }

        finish_stream(stream.take());
    });
}

fn finish_stream(stream: Option<SendStream>) {
    if let Some(mut stream) = stream {
        let _ = stream.finish();
    }
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::mouse::MouseForwarder;
use crate::quic::quic_runtime;

/// How often pending pointer motion is flushed to the wire. Any number of
/// raw samples inside one period collapses into at most one move event.
pub const MOVE_FLUSH_PERIOD: Duration = Duration::from_millis(100);

/// Periodic task driving `MouseForwarder::flush_moves`. Runs for as long
/// as the handle lives; dropping (or `stop`) aborts the task.
pub struct MoveTicker {
    task: JoinHandle<()>,
}

impl MoveTicker {
    /// Spawns the ticker on the shared client runtime.
    pub fn spawn(forwarder: Arc<Mutex<MouseForwarder>>) -> Self {
        Self {
            task: quic_runtime().spawn(run_ticker(forwarder)),
        }
    }

    /// Stops the periodic flush. Discrete events keep flushing on their
    /// own out-of-band path.
    pub fn stop(self) {}
}

impl Drop for MoveTicker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_ticker(forwarder: Arc<Mutex<MouseForwarder>>) {
    let mut ticker = time::interval(MOVE_FLUSH_PERIOD);
    // A stalled runtime should not burst a backlog of flushes afterwards.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick of a tokio interval completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        forwarder
            .lock()
            .expect("pointer state mutex poisoned")
            .flush_moves();
    }
}

#[cfg(test)]
mod tests {
    use shared::{HidPosition, MouseEvent};

    use super::*;
    use crate::channel::EventChannel;
    use crate::mouse::{ViewportInput, ViewportSize};

    #[derive(Default)]
    struct RecordingChannel {
        events: Mutex<Vec<MouseEvent>>,
    }

    impl RecordingChannel {
        fn take(&self) -> Vec<MouseEvent> {
            std::mem::take(&mut *self.events.lock().expect("event log mutex poisoned"))
        }
    }

    impl EventChannel for RecordingChannel {
        fn send(&self, event: &MouseEvent) {
            self.events
                .lock()
                .expect("event log mutex poisoned")
                .push(event.clone());
        }
    }

    fn shared_forwarder() -> (Arc<Mutex<MouseForwarder>>, Arc<RecordingChannel>) {
        let channel = Arc::new(RecordingChannel::default());
        let mut forwarder = MouseForwarder::new(
            ViewportSize {
                width: 800,
                height: 600,
            },
            |_| {},
        );
        forwarder.set_channel(Some(channel.clone()));
        (Arc::new(Mutex::new(forwarder)), channel)
    }

    #[tokio::test(start_paused = true)]
    async fn one_move_per_period_at_most() {
        let (forwarder, channel) = shared_forwarder();
        let ticker = tokio::spawn(run_ticker(Arc::clone(&forwarder)));

        {
            let mut fwd = forwarder.lock().expect("pointer state mutex poisoned");
            for x in [100, 200, 400] {
                fwd.handle(ViewportInput::Motion { x, y: 300 });
            }
        }

        time::sleep(MOVE_FLUSH_PERIOD + Duration::from_millis(10)).await;
        assert_eq!(
            channel.take(),
            vec![MouseEvent::move_to(HidPosition { x: -1, y: -1 })]
        );

        // Nothing changed, so later periods stay quiet.
        time::sleep(MOVE_FLUSH_PERIOD * 3).await;
        assert!(channel.take().is_empty());

        ticker.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_keeps_following_the_pointer() {
        let (forwarder, channel) = shared_forwarder();
        let ticker = tokio::spawn(run_ticker(Arc::clone(&forwarder)));

        forwarder
            .lock()
            .expect("pointer state mutex poisoned")
            .handle(ViewportInput::Motion { x: 0, y: 0 });
        time::sleep(MOVE_FLUSH_PERIOD + Duration::from_millis(10)).await;
        // (0,0) equals the initial sent position, so nothing goes out until
        // the pointer genuinely moves.
        assert!(channel.take().is_empty());

        forwarder
            .lock()
            .expect("pointer state mutex poisoned")
            .handle(ViewportInput::Motion { x: 400, y: 300 });
        time::sleep(MOVE_FLUSH_PERIOD + Duration::from_millis(10)).await;
        assert_eq!(
            channel.take(),
            vec![MouseEvent::move_to(HidPosition { x: -1, y: -1 })]
        );

        ticker.abort();
    }
}

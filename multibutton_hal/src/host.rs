//! Host event loop.
//!
//! Button drivers push key events into an mpsc channel from whatever
//! thread they run on. `EventLoop` drains that channel on one thread and
//! hands events to the binder one at a time.

use multibutton_common::consts::EVENT_POLL_MS;
use multibutton_common::gpio::driver::KeyEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info};

use crate::binder::PeripheralBinder;

/// Event counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Events the binder reported handled.
    pub handled: u64,
    /// Events with no route, or delivered while not running.
    pub unhandled: u64,
}

impl LoopStats {
    pub fn total(&self) -> u64 {
        self.handled + self.unhandled
    }
}

/// Serialized key event delivery.
pub struct EventLoop {
    receiver: Receiver<KeyEvent>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
    stats: LoopStats,
}

impl EventLoop {
    /// `running` is shared with whoever stops the loop (signal handler,
    /// stdin feeder).
    pub fn new(receiver: Receiver<KeyEvent>, running: Arc<AtomicBool>) -> Self {
        Self {
            receiver,
            running,
            poll_interval: Duration::from_millis(EVENT_POLL_MS),
            stats: LoopStats::default(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Dispatch events until the running flag is cleared or every sender
    /// is gone.
    pub fn run(&mut self, binder: &mut PeripheralBinder) -> LoopStats {
        info!("Event loop running");

        while self.running.load(Ordering::SeqCst) {
            match self.receiver.recv_timeout(self.poll_interval) {
                Ok(event) => self.deliver(binder, event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("All event senders dropped");
                    break;
                }
            }
        }

        info!(
            "Event loop stopped: {} handled, {} unhandled",
            self.stats.handled, self.stats.unhandled
        );
        self.stats
    }

    /// Dispatch everything already queued without blocking. Returns the
    /// number of events delivered.
    pub fn pump(&mut self, binder: &mut PeripheralBinder) -> usize {
        let mut count = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.deliver(binder, event);
            count += 1;
        }
        count
    }

    fn deliver(&mut self, binder: &mut PeripheralBinder, event: KeyEvent) {
        if binder.dispatch(event) {
            self.stats.handled += 1;
        } else {
            debug!("Unhandled {:?} for key {}", event.action, event.code);
            self.stats.unhandled += 1;
        }
    }
}

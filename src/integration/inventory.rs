//! Relay from engine events to an inventory store.
//!
//! Persistence runs on the consuming side of the event feed so a slow or
//! failing store can never stall frame processing. The relay drains the
//! engine's merged feed, which keeps pickups and releases in emission
//! order even while a stalled store lets a backlog build. Writes are
//! retried with a linear backoff; exhausted events are logged and
//! dropped, never escalated back into the engine.

use std::fmt;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, error, warn};

use crate::engine::{EngineEvent, PickupEngine, PickupEvent, ReleaseEvent};

/// Destination for pickup and release records.
///
/// Implementations decide what a record means: a database row, an HTTP
/// call, a log line. Errors only need to be printable; the relay owns the
/// retry policy.
pub trait InventoryStore: Send {
    /// Error type for failed writes.
    type Error: fmt::Display;

    /// Persist one pickup.
    fn record_pickup(&mut self, event: &PickupEvent) -> Result<(), Self::Error>;

    /// Persist one release.
    fn record_release(&mut self, event: &ReleaseEvent) -> Result<(), Self::Error>;
}

/// Retry schedule for store writes: attempt `n` failing waits
/// `base_delay * n` before the next try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Drains the engine's merged event feed into an [`InventoryStore`].
pub struct InventoryRelay<S> {
    store: S,
    policy: RetryPolicy,
    events: Receiver<EngineEvent>,
}

impl<S: InventoryStore> InventoryRelay<S> {
    /// Subscribe a relay to an engine's merged event feed.
    pub fn new(engine: &mut PickupEngine, store: S, policy: RetryPolicy) -> Self {
        Self::with_receiver(store, policy, engine.subscribe_events())
    }

    /// Build a relay over an explicit receiver.
    pub fn with_receiver(store: S, policy: RetryPolicy, events: Receiver<EngineEvent>) -> Self {
        Self {
            store,
            policy,
            events,
        }
    }

    /// Drain events until the feed disconnects, then hand the store back.
    ///
    /// Store mutations apply in the order the engine emitted them; a
    /// backlog of mixed pickups and releases is worked through first to
    /// last.
    pub fn run(mut self) -> S {
        while let Ok(event) = self.events.recv() {
            match event {
                EngineEvent::Pickup(event) => self.deliver_pickup(&event),
                EngineEvent::Release(event) => self.deliver_release(&event),
            }
        }
        self.store
    }

    /// Run the relay on its own thread; joining returns the store.
    pub fn spawn(self) -> thread::JoinHandle<S>
    where
        S: 'static,
    {
        thread::spawn(move || self.run())
    }

    fn deliver_pickup(&mut self, event: &PickupEvent) {
        let policy = self.policy;
        let delivered = with_retry(policy, "inventory pickup write", || {
            self.store.record_pickup(event)
        });
        if delivered {
            debug!("recorded pickup of {}", event.object.tracking_id);
        } else {
            error!(
                "dropping pickup of {} after {} attempts",
                event.object.tracking_id, policy.max_attempts
            );
        }
    }

    fn deliver_release(&mut self, event: &ReleaseEvent) {
        let policy = self.policy;
        let delivered = with_retry(policy, "inventory release write", || {
            self.store.record_release(event)
        });
        if delivered {
            debug!("recorded release of {}", event.tracking_id);
        } else {
            error!(
                "dropping release of {} after {} attempts",
                event.tracking_id, policy.max_attempts
            );
        }
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping `base_delay * n`
/// after failed attempt `n`. Returns whether any attempt succeeded.
fn with_retry<E: fmt::Display>(
    policy: RetryPolicy,
    label: &str,
    mut op: impl FnMut() -> Result<(), E>,
) -> bool {
    for attempt in 1..=policy.max_attempts {
        match op() {
            Ok(()) => return true,
            Err(err) => {
                warn!(
                    "{label} failed (attempt {attempt}/{}): {err}",
                    policy.max_attempts
                );
                if attempt < policy.max_attempts {
                    thread::sleep(policy.base_delay * attempt);
                }
            }
        }
    }
    false
}

//! Pickup and release event delivery.
//!
//! The engine fans events out over unbounded channels, one per subscriber.
//! Emission never blocks frame processing; subscribers whose receiver has
//! been dropped are pruned on the next send.

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::detection::{ObjectDetection, TrackingId};
use super::grasp::GraspType;

/// Emitted once per pickup, at the transition into carried.
#[derive(Debug, Clone, PartialEq)]
pub struct PickupEvent {
    /// Snapshot of the detection at pickup time.
    pub object: ObjectDetection,
    /// Smoothed overall confidence at pickup time.
    pub confidence: f32,
    /// Grasp posture that triggered the pickup.
    pub grasp: GraspType,
    pub timestamp_ms: f64,
}

/// Emitted once per release, at the transition out of carried.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseEvent {
    pub tracking_id: TrackingId,
    pub timestamp_ms: f64,
}

/// One engine decision on the merged feed.
///
/// The per-kind streams carry no ordering between a pickup and a release;
/// consumers applying both kinds of mutation to one destination subscribe
/// to the merged feed, which delivers them in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Pickup(PickupEvent),
    Release(ReleaseEvent),
}

/// Fan-out of engine events to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventSink {
    pickup_subscribers: Vec<Sender<PickupEvent>>,
    release_subscribers: Vec<Sender<ReleaseEvent>>,
    event_subscribers: Vec<Sender<EngineEvent>>,
    closed: bool,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a pickup stream. After [`EventSink::close`] the returned
    /// receiver reports disconnected immediately.
    pub fn subscribe_pickups(&mut self) -> Receiver<PickupEvent> {
        let (tx, rx) = unbounded();
        if !self.closed {
            self.pickup_subscribers.push(tx);
        }
        rx
    }

    /// Open a release stream.
    pub fn subscribe_releases(&mut self) -> Receiver<ReleaseEvent> {
        let (tx, rx) = unbounded();
        if !self.closed {
            self.release_subscribers.push(tx);
        }
        rx
    }

    /// Open a merged stream carrying both event kinds in emission order.
    pub fn subscribe_events(&mut self) -> Receiver<EngineEvent> {
        let (tx, rx) = unbounded();
        if !self.closed {
            self.event_subscribers.push(tx);
        }
        rx
    }

    pub fn emit_pickup(&mut self, event: PickupEvent) {
        self.event_subscribers
            .retain(|tx| tx.send(EngineEvent::Pickup(event.clone())).is_ok());
        self.pickup_subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn emit_release(&mut self, event: ReleaseEvent) {
        self.event_subscribers
            .retain(|tx| tx.send(EngineEvent::Release(event.clone())).is_ok());
        self.release_subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Drop all subscriber channels; their receivers see a disconnect.
    pub fn close(&mut self) {
        self.closed = true;
        self.pickup_subscribers.clear();
        self.release_subscribers.clear();
        self.event_subscribers.clear();
    }

    /// Live pickup subscriber count, after pruning.
    pub fn pickup_subscriber_count(&self) -> usize {
        self.pickup_subscribers.len()
    }

    /// Live release subscriber count, after pruning.
    pub fn release_subscriber_count(&self) -> usize {
        self.release_subscribers.len()
    }
}

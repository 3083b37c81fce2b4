use std::time::Duration;

use crossbeam_channel::unbounded;
use grasptrack_rs::integration::{InventoryRelay, InventoryStore, RetryPolicy};
use grasptrack_rs::{
    EngineConfig, EngineEvent, FrameInput, GraspType, HandFrame, Handedness, ObjectDetection,
    PickupEngine, PickupEvent, Rect, ReleaseEvent, TrackingId,
};
use nalgebra::Point2;

/// First call installs the subscriber; later calls in the same test binary
/// hit `try_init`'s already-set error and are ignored.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct MockStore {
    pickups: Vec<String>,
    releases: Vec<String>,
    /// Successful writes of both kinds, in application order.
    journal: Vec<String>,
    /// Number of upcoming writes to fail before succeeding again.
    fail_next: u32,
    attempts: u32,
}

impl InventoryStore for MockStore {
    type Error = String;

    fn record_pickup(&mut self, event: &PickupEvent) -> Result<(), String> {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err("store offline".into());
        }
        let id = event.object.tracking_id.to_string();
        self.journal.push(format!("pickup {id}"));
        self.pickups.push(id);
        Ok(())
    }

    fn record_release(&mut self, event: &ReleaseEvent) -> Result<(), String> {
        self.attempts += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err("store offline".into());
        }
        let id = event.tracking_id.to_string();
        self.journal.push(format!("release {id}"));
        self.releases.push(id);
        Ok(())
    }
}

fn zero_delay(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::ZERO,
    }
}

fn pickup_event(id: &str) -> PickupEvent {
    PickupEvent {
        object: ObjectDetection::new(id, "cup", Rect::new(100.0, 100.0, 40.0, 40.0), 0.9),
        confidence: 0.8,
        grasp: GraspType::PowerGrip,
        timestamp_ms: 10.0,
    }
}

fn release_event(id: &str, timestamp_ms: f64) -> ReleaseEvent {
    ReleaseEvent {
        tracking_id: TrackingId::from(id),
        timestamp_ms,
    }
}

/// Power-grip hand centered on (ox, oy), normalized for a 640x480 identity
/// mapping. Same template the engine flow tests use.
fn power_grip_hand(ox: f32, oy: f32) -> HandFrame {
    let mut pts: Vec<(f32, f32)> = vec![(0.0, 100.0)];
    pts.extend([(-45.0, 60.0), (-55.0, 42.0), (-60.0, 30.0), (-60.0, 20.0)]);
    for dx in [-21.0, -7.0, 7.0, 21.0] {
        pts.extend([(dx, 12.0), (dx, -8.0), (dx + 14.0, -8.0), (dx + 14.0, 6.0)]);
    }
    HandFrame::new(
        pts.iter()
            .map(|&(x, y)| Point2::new((x + ox) / 640.0, (y + oy) / 480.0))
            .collect(),
        Handedness::Right,
    )
}

#[test]
fn test_relay_records_engine_events() {
    init_tracing();
    let mut engine = PickupEngine::new(EngineConfig::default()).unwrap();
    engine
        .set_view_transform((640.0, 480.0), (640.0, 480.0))
        .unwrap();
    let relay = InventoryRelay::new(&mut engine, MockStore::default(), zero_delay(3));
    let handle = relay.spawn();

    let frame = |t: f64, hand_x: f32| {
        FrameInput::new(t)
            .with_detections(vec![ObjectDetection::new(
                "bottle-1",
                "bottle",
                Rect::from_center(Point2::new(320.0, 240.0), 60.0, 60.0),
                0.9,
            )])
            .with_hands(vec![power_grip_hand(hand_x, 240.0)])
    };

    // Grip on the object, then withdraw far and wait out the dwell.
    engine.process_frame(frame(0.0, 320.0));
    engine.process_frame(frame(1000.0, 605.0));
    engine.process_frame(frame(1100.0, 605.0));
    engine.process_frame(frame(1200.0, 605.0));
    assert_eq!(engine.stats().pickups, 1);
    assert_eq!(engine.stats().releases, 1);

    // Shutdown disconnects the relay's receivers; run ends after draining.
    engine.shutdown();
    let store = handle.join().unwrap();
    assert_eq!(store.pickups, ["bottle-1"]);
    assert_eq!(store.releases, ["bottle-1"]);
}

#[test]
fn test_store_write_retries_until_success() {
    init_tracing();
    let (tx, rx) = unbounded();
    let store = MockStore {
        fail_next: 2,
        ..Default::default()
    };
    let relay = InventoryRelay::with_receiver(store, zero_delay(3), rx);

    tx.send(EngineEvent::Pickup(pickup_event("obj-1"))).unwrap();
    drop(tx);
    let store = relay.run();

    assert_eq!(store.attempts, 3);
    assert_eq!(store.pickups, ["obj-1"]);
}

#[test]
fn test_exhausted_event_is_dropped_not_fatal() {
    init_tracing();
    let (tx, rx) = unbounded();
    // Exactly enough failures to exhaust the first event's attempts.
    let store = MockStore {
        fail_next: 3,
        ..Default::default()
    };
    let relay = InventoryRelay::with_receiver(store, zero_delay(3), rx);

    tx.send(EngineEvent::Pickup(pickup_event("doomed"))).unwrap();
    tx.send(EngineEvent::Pickup(pickup_event("delivered"))).unwrap();
    drop(tx);
    let store = relay.run();

    assert_eq!(store.attempts, 4);
    assert_eq!(store.pickups, ["delivered"]);
}

#[test]
fn test_releases_recorded_in_order() {
    let (tx, rx) = unbounded();
    let relay = InventoryRelay::with_receiver(MockStore::default(), RetryPolicy::default(), rx);

    for i in 0..3 {
        let event = EngineEvent::Release(release_event(&format!("obj-{i}"), i as f64));
        tx.send(event).unwrap();
    }
    drop(tx);
    let store = relay.run();

    assert_eq!(store.releases, ["obj-0", "obj-1", "obj-2"]);
    assert_eq!(store.attempts, 3);
    assert!(store.pickups.is_empty());
}

#[test]
fn test_preloaded_backlog_applies_in_emission_order() {
    init_tracing();
    let (tx, rx) = unbounded();
    // A full carry cycle plus a re-pickup, all backlogged before the relay
    // gets to run, as happens behind a stalled store.
    tx.send(EngineEvent::Pickup(pickup_event("obj-1"))).unwrap();
    tx.send(EngineEvent::Release(release_event("obj-1", 300.0)))
        .unwrap();
    tx.send(EngineEvent::Pickup(pickup_event("obj-1"))).unwrap();
    drop(tx);

    let store = InventoryRelay::with_receiver(MockStore::default(), zero_delay(3), rx).run();
    assert_eq!(
        store.journal,
        ["pickup obj-1", "release obj-1", "pickup obj-1"]
    );
}

#[test]
fn test_engine_backlog_keeps_pickup_before_release() {
    init_tracing();
    let mut engine = PickupEngine::new(EngineConfig::default()).unwrap();
    engine
        .set_view_transform((640.0, 480.0), (640.0, 480.0))
        .unwrap();
    let relay = InventoryRelay::new(&mut engine, MockStore::default(), zero_delay(3));

    let frame = |t: f64, hand_x: f32| {
        FrameInput::new(t)
            .with_detections(vec![ObjectDetection::new(
                "bottle-1",
                "bottle",
                Rect::from_center(Point2::new(320.0, 240.0), 60.0, 60.0),
                0.9,
            )])
            .with_hands(vec![power_grip_hand(hand_x, 240.0)])
    };

    // Pickup and release are both buffered before the relay drains.
    engine.process_frame(frame(0.0, 320.0));
    engine.process_frame(frame(1000.0, 605.0));
    engine.process_frame(frame(1200.0, 605.0));
    engine.shutdown();

    let store = relay.run();
    assert_eq!(store.journal, ["pickup bottle-1", "release bottle-1"]);
}

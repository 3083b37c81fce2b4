//! Main pickup-detection engine.

use std::collections::{HashMap, HashSet};

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::error::EngineError;

use super::candidate::{self, PickupCandidate};
use super::config::EngineConfig;
use super::detection::{FrameInput, ObjectDetection, TrackingId};
use super::events::{EngineEvent, EventSink, PickupEvent, ReleaseEvent};
use super::grasp::{self, GraspAnalysis, GraspType};
use super::landmark::{HandFrame, ProjectedHand};
use super::object_state::ObjectState;
use super::phase::TrackPhase;
use super::proximity::{self, ProximityAnalysis};
use super::viewport::ViewTransform;

/// How a frame was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Full geometry pass ran.
    Processed,
    /// No usable hands; only detection bookkeeping ran.
    DetectionOnly,
    /// Frame arrived inside the pacing interval and was dropped whole.
    RateLimited,
    /// The engine has been shut down.
    ShutDown,
}

/// Per-frame summary returned by [`PickupEngine::process_frame`].
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub outcome: FrameOutcome,
    pub timestamp_ms: f64,
    pub objects_seen: usize,
    pub hands_seen: usize,
    /// Hands dropped by projection or for lack of a coordinate context.
    pub hands_skipped: usize,
    /// Object admitted to carried this frame, if any.
    pub picked_up: Option<TrackingId>,
    /// Object that won arbitration but was refused for capacity.
    pub pickup_rejected: Option<TrackingId>,
    /// Objects released this frame, in release order.
    pub released: Vec<TrackingId>,
}

/// Running totals since engine creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub frames_detection_only: u64,
    pub pickups: u64,
    pub releases: u64,
    /// Releases forced by expiry or vanished detections rather than by a
    /// hand putting the object down.
    pub auto_releases: u64,
    pub capacity_rejections: u64,
}

/// Turns per-frame detections and hand landmarks into targeting, pickup and
/// release decisions.
///
/// The engine is single-threaded by design: one `process_frame` call per
/// camera frame, on whatever thread the caller prefers. Time comes entirely
/// from `FrameInput::timestamp_ms`.
pub struct PickupEngine {
    config: EngineConfig,
    transform: Option<ViewTransform>,
    states: HashMap<TrackingId, ObjectState>,
    /// Carried ids in pickup order.
    carried: Vec<TrackingId>,
    events: EventSink,
    last_processed_ms: Option<f64>,
    stats: EngineStats,
    shut_down: bool,
}

impl Default for PickupEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            transform: None,
            states: HashMap::new(),
            carried: Vec::new(),
            events: EventSink::new(),
            last_processed_ms: None,
            stats: EngineStats::default(),
            shut_down: false,
        }
    }
}

impl PickupEngine {
    /// Create an engine with a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;
        info!(
            "pickup engine ready (max carried {}, frame interval {}ms)",
            config.max_carried, config.min_frame_interval_ms
        );
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Install the sensor-to-display mapping. Until this is called, frames
    /// with hands degrade to detection-only processing.
    pub fn set_view_transform(
        &mut self,
        sensor_size: (f32, f32),
        surface_size: (f32, f32),
    ) -> Result<(), EngineError> {
        let transform = ViewTransform::new(sensor_size, surface_size)?;
        debug!(
            "coordinate context set: sensor {:?} onto surface {:?} (scale {:.3})",
            sensor_size,
            surface_size,
            transform.scale()
        );
        self.transform = Some(transform);
        Ok(())
    }

    /// Process one frame of detections and hands.
    pub fn process_frame(&mut self, frame: FrameInput) -> FrameReport {
        let now = frame.timestamp_ms;
        let mut report = FrameReport {
            outcome: FrameOutcome::Processed,
            timestamp_ms: now,
            objects_seen: frame.detections.len(),
            hands_seen: frame.hands.len(),
            hands_skipped: 0,
            picked_up: None,
            pickup_rejected: None,
            released: Vec::new(),
        };

        if self.shut_down {
            report.outcome = FrameOutcome::ShutDown;
            return report;
        }

        // Step 1: frame pacing against the caller clock
        if let Some(last) = self.last_processed_ms {
            if now - last < self.config.min_frame_interval_ms {
                self.stats.frames_dropped += 1;
                report.outcome = FrameOutcome::RateLimited;
                return report;
            }
        }
        self.last_processed_ms = Some(now);

        // Step 2: detection bookkeeping, shared by every processed frame
        let seen = seen_ids(&frame.detections);
        for detection in &frame.detections {
            match self.states.get_mut(&detection.tracking_id) {
                Some(state) => state.observe(detection.clone(), now),
                None => {
                    let mut state = ObjectState::new(detection.clone(), now);
                    // The carried list survives state eviction. A rebuilt
                    // state for a carried id re-adopts the carry, or the
                    // object would qualify for a second pickup.
                    if self.carried.contains(&detection.tracking_id) {
                        warn!(
                            "rebuilding state for carried object {}, keeping the carry",
                            detection.tracking_id
                        );
                        state.mark_carried(now);
                    } else {
                        debug!(
                            "tracking new object {} ({})",
                            detection.tracking_id, detection.label
                        );
                    }
                    self.states.insert(detection.tracking_id.clone(), state);
                }
            }
        }
        for id in &self.carried {
            if !seen.contains(id) {
                if let Some(state) = self.states.get_mut(id) {
                    state.touch(now);
                }
            }
        }

        // Step 3: project hands; with none usable the frame is detection-only
        let hands = self.project_hands(&frame.hands, &mut report);
        if hands.is_empty() {
            self.stats.frames_detection_only += 1;
            report.outcome = FrameOutcome::DetectionOnly;
            return report;
        }

        // Step 4: analyze every object against its best hand
        let grasps: Vec<GraspAnalysis> = hands
            .iter()
            .map(|hand| grasp::analyze(hand.landmarks(), &self.config.grasp))
            .collect();
        let proximities: Vec<Vec<ProximityAnalysis>> = frame
            .detections
            .iter()
            .map(|detection| {
                hands
                    .iter()
                    .map(|hand| {
                        proximity::analyze(
                            &detection.bbox,
                            hand.landmarks(),
                            &self.config.proximity,
                        )
                    })
                    .collect()
            })
            .collect();
        let best = candidate::best_hand_per_object(&candidate::pair_scores(&proximities, &grasps));

        for (i, detection) in frame.detections.iter().enumerate() {
            let Some(j) = best[i] else {
                continue;
            };
            if let Some(state) = self.states.get_mut(&detection.tracking_id) {
                state.apply_analysis(
                    proximities[i][j],
                    grasps[j],
                    now,
                    self.config.smoothing_window,
                );
            }
        }

        // Step 5: arbitrate this frame's pickup, one winner at most
        let mut candidates = Vec::new();
        for detection in &frame.detections {
            if let Some(state) = self.states.get(&detection.tracking_id) {
                if state.pickup_eligible(&self.config) {
                    candidates.push(PickupCandidate {
                        tracking_id: state.tracking_id.clone(),
                        score: candidate::score(state, self.config.proximity.far_radius_px),
                    });
                }
            }
        }
        if let Some(winner) = candidate::select_winner(&candidates) {
            let id = winner.tracking_id.clone();
            if self.carried.len() >= self.config.max_carried {
                warn!(
                    "pickup of {} rejected, already carrying {} objects",
                    id,
                    self.carried.len()
                );
                self.stats.capacity_rejections += 1;
                report.pickup_rejected = Some(id);
            } else {
                self.admit_pickup(&id, now);
                report.picked_up = Some(id);
            }
        }

        // Step 6: release carries that have disengaged
        let releasable: Vec<TrackingId> = self
            .carried
            .iter()
            .filter(|id| {
                self.states
                    .get(*id)
                    .is_some_and(|state| state.release_eligible(now, &self.config))
            })
            .cloned()
            .collect();
        for id in releasable {
            self.release_object(&id, now);
            report.released.push(id);
        }

        // Step 7: expire idle state and clean up stranded carries
        self.expire_states(now, &mut report);
        let stranded: Vec<TrackingId> = self
            .carried
            .iter()
            .filter(|id| !seen.contains(*id) && !self.states.contains_key(*id))
            .cloned()
            .collect();
        for id in stranded {
            warn!("carried object {id} lost both detection and state, releasing");
            self.stats.auto_releases += 1;
            self.release_object(&id, now);
            report.released.push(id);
        }

        self.stats.frames_processed += 1;
        report
    }

    /// Subscribe to pickup events.
    pub fn subscribe_pickups(&mut self) -> Receiver<PickupEvent> {
        self.events.subscribe_pickups()
    }

    /// Subscribe to release events.
    pub fn subscribe_releases(&mut self) -> Receiver<ReleaseEvent> {
        self.events.subscribe_releases()
    }

    /// Subscribe to the merged feed of pickups and releases, delivered in
    /// emission order.
    pub fn subscribe_events(&mut self) -> Receiver<EngineEvent> {
        self.events.subscribe_events()
    }

    /// Ids of currently carried objects, in pickup order.
    pub fn carried_ids(&self) -> &[TrackingId] {
        &self.carried
    }

    pub fn carried_count(&self) -> usize {
        self.carried.len()
    }

    pub fn is_carried(&self, id: &TrackingId) -> bool {
        self.carried.iter().any(|c| c == id)
    }

    pub fn is_targeted(&self, id: &TrackingId) -> bool {
        self.states.get(id).is_some_and(|state| state.targeted)
    }

    /// Smoothed overall confidence for an object, if state exists.
    pub fn pickup_confidence(&self, id: &TrackingId) -> Option<f32> {
        self.states.get(id).map(|state| state.smoothed_confidence())
    }

    /// Lifecycle phase for an object, if state exists.
    pub fn phase(&self, id: &TrackingId) -> Option<TrackPhase> {
        self.states.get(id).map(|state| state.phase())
    }

    /// Full state record for an object.
    pub fn state(&self, id: &TrackingId) -> Option<&ObjectState> {
        self.states.get(id)
    }

    /// Number of objects with live state.
    pub fn tracked_count(&self) -> usize {
        self.states.len()
    }

    /// Drop an object's state, returning it if it existed.
    ///
    /// Removing a carried object's state does not by itself release it: if
    /// its detection is also gone, the next processed frame emits the
    /// release and clears the carry.
    pub fn remove_state(&mut self, id: &TrackingId) -> Option<ObjectState> {
        self.states.remove(id)
    }

    pub fn view_transform(&self) -> Option<&ViewTransform> {
        self.transform.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Drop all state and disconnect every subscriber. Frames arriving
    /// afterwards report [`FrameOutcome::ShutDown`] and do nothing.
    pub fn shutdown(&mut self) {
        if !self.shut_down {
            info!(
                "pickup engine shutting down ({} states, {} carried)",
                self.states.len(),
                self.carried.len()
            );
        }
        self.shut_down = true;
        self.states.clear();
        self.carried.clear();
        self.events.close();
    }

    fn project_hands(&self, hands: &[HandFrame], report: &mut FrameReport) -> Vec<ProjectedHand> {
        let Some(transform) = self.transform.as_ref() else {
            if !hands.is_empty() {
                warn!("no coordinate context set, skipping {} hands", hands.len());
                report.hands_skipped = hands.len();
            }
            return Vec::new();
        };
        let mut projected = Vec::with_capacity(hands.len());
        for hand in hands {
            match transform.project_hand(hand) {
                Ok(p) => projected.push(p),
                Err(err) => {
                    debug!("skipping hand: {err}");
                    report.hands_skipped += 1;
                }
            }
        }
        projected
    }

    fn admit_pickup(&mut self, id: &TrackingId, now: f64) {
        let event = {
            let Some(state) = self.states.get_mut(id) else {
                return;
            };
            state.mark_carried(now);
            PickupEvent {
                object: state.detection.clone(),
                confidence: state.smoothed_confidence(),
                grasp: state.grasp.map_or(GraspType::Unknown, |g| g.grasp),
                timestamp_ms: now,
            }
        };
        self.carried.push(id.clone());
        self.stats.pickups += 1;
        info!(
            "picked up {} ({}, {:?}, confidence {:.2})",
            id, event.object.label, event.grasp, event.confidence
        );
        self.events.emit_pickup(event);
    }

    fn release_object(&mut self, id: &TrackingId, now: f64) {
        if let Some(state) = self.states.get_mut(id) {
            state.mark_released(now);
        }
        self.carried.retain(|c| c != id);
        self.stats.releases += 1;
        info!("released {id}");
        self.events.emit_release(ReleaseEvent {
            tracking_id: id.clone(),
            timestamp_ms: now,
        });
    }

    fn expire_states(&mut self, now: f64, report: &mut FrameReport) {
        let expired: Vec<TrackingId> = self
            .states
            .values()
            .filter(|state| {
                !state.carried && now - state.last_seen_ms > self.config.state_timeout_ms
            })
            .map(|state| state.tracking_id.clone())
            .collect();
        for id in expired {
            debug!("expiring idle state for {id}");
            self.states.remove(&id);
        }

        // Carried objects get a longer leash, then a forced release so no
        // subscriber is left believing the object is still in hand.
        let lost_carries: Vec<TrackingId> = self
            .states
            .values()
            .filter(|state| {
                state.carried && now - state.last_seen_ms > self.config.carried_timeout_ms
            })
            .map(|state| state.tracking_id.clone())
            .collect();
        for id in lost_carries {
            warn!("carried object {id} unseen too long, force releasing");
            self.stats.auto_releases += 1;
            self.release_object(&id, now);
            self.states.remove(&id);
            report.released.push(id);
        }
    }
}

fn seen_ids(detections: &[ObjectDetection]) -> HashSet<TrackingId> {
    detections
        .iter()
        .map(|detection| detection.tracking_id.clone())
        .collect()
}

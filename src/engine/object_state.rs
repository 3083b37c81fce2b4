//! Per-object pickup state, keyed by the detector's tracking id.

use std::collections::VecDeque;

use super::config::EngineConfig;
use super::detection::{ObjectDetection, TrackingId};
use super::grasp::GraspAnalysis;
use super::phase::TrackPhase;
use super::proximity::{ProximityAnalysis, ProximityZone};

/// Blend weights for the per-frame overall confidence.
pub(crate) const PROXIMITY_WEIGHT: f32 = 0.5;
pub(crate) const GRASP_WEIGHT: f32 = 0.4;
pub(crate) const STABILITY_WEIGHT: f32 = 0.1;

/// Pickup state for a single tracked object.
#[derive(Debug, Clone)]
pub struct ObjectState {
    /// Detector identity this state belongs to.
    pub tracking_id: TrackingId,
    /// Most recent detection of the object.
    pub detection: ObjectDetection,
    /// Timestamp of the first detection, caller clock.
    pub first_seen_ms: f64,
    /// Timestamp of the most recent detection.
    pub last_seen_ms: f64,
    /// Timestamp of the most recent state mutation of any kind.
    pub last_update_ms: f64,
    /// Frames in a row the object has been detected.
    pub consecutive_detections: u32,
    /// Latest proximity read from the best hand, if any hand was usable.
    pub proximity: Option<ProximityAnalysis>,
    /// Latest grasp read from the best hand.
    pub grasp: Option<GraspAnalysis>,
    /// Whether a hand is currently within grabbing range.
    pub targeted: bool,
    /// Whether the object is currently picked up.
    pub carried: bool,
    pub targeting_started_ms: Option<f64>,
    pub targeting_ended_ms: Option<f64>,
    pub picked_up_ms: Option<f64>,
    pub released_ms: Option<f64>,
    /// Recent overall confidences, newest last, capped at the smoothing window.
    history: VecDeque<f32>,
    smoothed_confidence: f32,
}

impl ObjectState {
    /// Create state for a newly seen object.
    pub fn new(detection: ObjectDetection, now_ms: f64) -> Self {
        Self {
            tracking_id: detection.tracking_id.clone(),
            detection,
            first_seen_ms: now_ms,
            last_seen_ms: now_ms,
            last_update_ms: now_ms,
            consecutive_detections: 1,
            proximity: None,
            grasp: None,
            targeted: false,
            carried: false,
            targeting_started_ms: None,
            targeting_ended_ms: None,
            picked_up_ms: None,
            released_ms: None,
            history: VecDeque::new(),
            smoothed_confidence: 0.0,
        }
    }

    /// Record a fresh detection of the object.
    pub fn observe(&mut self, detection: ObjectDetection, now_ms: f64) {
        self.detection = detection;
        self.last_seen_ms = now_ms;
        self.last_update_ms = now_ms;
        self.consecutive_detections += 1;
    }

    /// Keep a carried object alive through a frame without a detection.
    pub fn touch(&mut self, now_ms: f64) {
        self.last_update_ms = now_ms;
    }

    /// Fold one frame's analyses into the confidence window and run the
    /// targeting transition. Targeting follows the zone directly, with no
    /// hysteresis: near means targeted, anything else means not.
    pub fn apply_analysis(
        &mut self,
        proximity: ProximityAnalysis,
        grasp: GraspAnalysis,
        now_ms: f64,
        window: usize,
    ) {
        let stability = self.stability();
        let overall = PROXIMITY_WEIGHT * proximity.confidence
            + GRASP_WEIGHT * grasp.confidence
            + STABILITY_WEIGHT * stability;

        self.history.push_back(overall.clamp(0.0, 1.0));
        while self.history.len() > window.max(1) {
            self.history.pop_front();
        }
        self.smoothed_confidence =
            self.history.iter().sum::<f32>() / self.history.len() as f32;

        let was_targeted = self.targeted;
        self.targeted = proximity.zone == ProximityZone::Near;
        if self.targeted && !was_targeted {
            self.targeting_started_ms = Some(now_ms);
        } else if !self.targeted && was_targeted {
            self.targeting_ended_ms = Some(now_ms);
        }

        self.proximity = Some(proximity);
        self.grasp = Some(grasp);
        self.last_update_ms = now_ms;
    }

    pub fn mark_carried(&mut self, now_ms: f64) {
        self.carried = true;
        self.picked_up_ms = Some(now_ms);
        self.last_update_ms = now_ms;
    }

    pub fn mark_released(&mut self, now_ms: f64) {
        self.carried = false;
        self.released_ms = Some(now_ms);
        self.last_update_ms = now_ms;
    }

    /// Whether this frame's read qualifies the object for pickup.
    pub fn pickup_eligible(&self, config: &EngineConfig) -> bool {
        !self.carried
            && self.zone() == ProximityZone::Near
            && self.grasp_confidence() > config.pickup_grasp_floor
    }

    /// Whether a carried object has disengaged long enough to be released.
    ///
    /// Requires the release dwell to have elapsed since targeting ended,
    /// and then either a collapsed confidence or a hand that has moved out
    /// past the close zone.
    pub fn release_eligible(&self, now_ms: f64, config: &EngineConfig) -> bool {
        if !self.carried || self.targeted {
            return false;
        }
        let Some(ended) = self.targeting_ended_ms else {
            return false;
        };
        if now_ms - ended < config.release_dwell_ms {
            return false;
        }
        self.smoothed_confidence < config.release_confidence_floor
            || matches!(self.zone(), ProximityZone::Far | ProximityZone::Ignore)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> TrackPhase {
        if self.carried {
            TrackPhase::Carried
        } else if self.targeted {
            TrackPhase::Targeted
        } else if self.released_ms.is_some() {
            TrackPhase::Released
        } else {
            TrackPhase::Detected
        }
    }

    /// Zone from the latest proximity read, ignore when none exists.
    #[inline]
    pub fn zone(&self) -> ProximityZone {
        self.proximity.map_or(ProximityZone::Ignore, |p| p.zone)
    }

    /// Confidence from the latest grasp read, zero when none exists.
    #[inline]
    pub fn grasp_confidence(&self) -> f32 {
        self.grasp.map_or(0.0, |g| g.confidence)
    }

    /// Window-averaged overall confidence.
    #[inline]
    pub fn smoothed_confidence(&self) -> f32 {
        self.smoothed_confidence
    }

    /// How steady recent confidences have been: 1 minus the variance of
    /// the current window. An empty window counts as perfectly steady.
    pub fn stability(&self) -> f32 {
        (1.0 - variance(&self.history)).clamp(0.0, 1.0)
    }
}

fn variance(values: &VecDeque<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n
}

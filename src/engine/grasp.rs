//! Grasp posture analysis over a projected hand.
//!
//! Everything here is a pure function of one frame's landmark geometry.
//! No smoothing, no history: stability across frames is the state
//! machine's job.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use super::landmark::{FINGERTIPS, Finger, LANDMARK_COUNT, THUMB_TIP};

const EPS: f32 = 1e-4;

/// Curl ceiling below which an opposed hand counts as a pinch.
const PINCH_CURL_CEILING: f32 = 0.3;
/// Minimum average curl for a partial grasp.
const PARTIAL_CURL_FLOOR: f32 = 0.1;
/// Closure allowance for a partial grasp, relative to the threshold.
const PARTIAL_CLOSURE_FACTOR: f32 = 1.2;
/// Spread beyond this multiple of the threshold reads as an open palm.
const OPEN_CLOSURE_FACTOR: f32 = 1.5;
/// Fixed confidence reported for an open palm.
const OPEN_PALM_CONFIDENCE: f32 = 0.1;

/// Grasp taxonomy, most specific postures first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraspType {
    /// Thumb and a straight finger meeting, as when lifting something small.
    Pinch,
    /// Thumb opposing curled fingers.
    PrecisionGrip,
    /// Fingers wrapped around the object, thumb to the side.
    PowerGrip,
    /// Some curl, not yet a committed grip.
    PartialGrasp,
    /// Flat, spread hand.
    OpenPalm,
    #[default]
    Unknown,
}

/// Thresholds for the grasp classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraspConfig {
    /// Average curl above which fingers count as wrapped.
    pub curl_threshold: f32,
    /// Fingertip spread below which the hand counts as closed, in pixels.
    pub closure_threshold_px: f32,
    /// Thumb-to-fingertip distance mapping to zero opposition, in pixels.
    pub opposition_range_px: f32,
    /// Opposition strength above which the thumb counts as opposing.
    pub opposition_floor: f32,
}

impl Default for GraspConfig {
    fn default() -> Self {
        Self {
            curl_threshold: 0.2,
            closure_threshold_px: 120.0,
            opposition_range_px: 80.0,
            opposition_floor: 0.4,
        }
    }
}

impl GraspConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.curl_threshold) {
            return Err("curl_threshold must lie in [0, 1]".into());
        }
        if self.closure_threshold_px <= 0.0 {
            return Err("closure_threshold_px must be positive".into());
        }
        if self.opposition_range_px <= 0.0 {
            return Err("opposition_range_px must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.opposition_floor) {
            return Err("opposition_floor must lie in [0, 1]".into());
        }
        Ok(())
    }
}

/// Thumb tip measured against the nearest other fingertip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbOpposition {
    /// Finger whose tip is closest to the thumb tip.
    pub closest: Finger,
    /// Distance to that tip, in pixels.
    pub distance: f32,
    /// 1 at contact, 0 at or beyond the opposition range.
    pub strength: f32,
}

/// Full grasp read for one hand in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraspAnalysis {
    pub grasp: GraspType,
    /// Classifier confidence in [0, 1].
    pub confidence: f32,
    /// Per-finger curl in [0, 1], indexed by [`Finger`].
    pub finger_curls: [f32; 5],
    pub opposition: Option<ThumbOpposition>,
    /// Widest fingertip-to-fingertip distance, in pixels.
    pub closure: f32,
}

impl GraspAnalysis {
    /// Analysis for an absent or unusable hand.
    pub fn empty() -> Self {
        Self {
            grasp: GraspType::Unknown,
            confidence: 0.0,
            finger_curls: [0.0; 5],
            opposition: None,
            closure: 0.0,
        }
    }

    #[inline]
    pub fn curl(&self, finger: Finger) -> f32 {
        self.finger_curls[finger as usize]
    }

    #[inline]
    pub fn average_curl(&self) -> f32 {
        self.finger_curls.iter().sum::<f32>() / self.finger_curls.len() as f32
    }
}

/// Analyze the grasp posture of a display-space hand.
///
/// Anything but a complete landmark set yields the empty analysis.
pub fn analyze(landmarks: &[Point2<f32>], config: &GraspConfig) -> GraspAnalysis {
    if landmarks.len() != LANDMARK_COUNT {
        return GraspAnalysis::empty();
    }

    let finger_curls = Finger::ALL.map(|f| finger_curl(landmarks, f));
    let average = finger_curls.iter().sum::<f32>() / finger_curls.len() as f32;
    let opposition = thumb_opposition(landmarks, config.opposition_range_px);
    let closure = fingertip_spread(landmarks);
    let (grasp, confidence) = classify(average, opposition.as_ref(), closure, config);

    GraspAnalysis {
        grasp,
        confidence: confidence.clamp(0.0, 1.0),
        finger_curls,
        opposition,
        closure,
    }
}

/// How bent one finger is: 1 minus the ratio of the base-to-tip distance to
/// the summed joint segment lengths. Straight fingers score near 0, folded
/// fingers approach 1.
fn finger_curl(landmarks: &[Point2<f32>], finger: Finger) -> f32 {
    let chain = finger.joint_chain();
    let straight = (landmarks[chain[3]] - landmarks[chain[0]]).norm();
    let segments = (landmarks[chain[1]] - landmarks[chain[0]]).norm()
        + (landmarks[chain[2]] - landmarks[chain[1]]).norm()
        + (landmarks[chain[3]] - landmarks[chain[2]]).norm();
    if segments <= EPS {
        return 0.0;
    }
    (1.0 - straight / segments).clamp(0.0, 1.0)
}

/// Thumb tip against the nearest of the other four fingertips.
fn thumb_opposition(landmarks: &[Point2<f32>], range_px: f32) -> Option<ThumbOpposition> {
    let thumb = landmarks[THUMB_TIP];
    let mut best: Option<(Finger, f32)> = None;
    for finger in [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky] {
        let distance = (landmarks[finger.tip()] - thumb).norm();
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((finger, distance));
        }
    }
    best.map(|(closest, distance)| ThumbOpposition {
        closest,
        distance,
        strength: (1.0 - distance / range_px).clamp(0.0, 1.0),
    })
}

/// Maximum pairwise fingertip distance.
fn fingertip_spread(landmarks: &[Point2<f32>]) -> f32 {
    let mut max = 0.0f32;
    for (i, &a) in FINGERTIPS.iter().enumerate() {
        for &b in &FINGERTIPS[i + 1..] {
            max = max.max((landmarks[a] - landmarks[b]).norm());
        }
    }
    max
}

/// Priority classification: opposition first, then wrap, then weaker reads.
fn classify(
    average_curl: f32,
    opposition: Option<&ThumbOpposition>,
    closure: f32,
    config: &GraspConfig,
) -> (GraspType, f32) {
    let strength = opposition.map_or(0.0, |o| o.strength);
    let tightness = 1.0 - (closure / config.closure_threshold_px).min(1.0);

    if strength > config.opposition_floor && closure < config.closure_threshold_px {
        if average_curl < PINCH_CURL_CEILING {
            (GraspType::Pinch, 0.6 * strength + 0.4 * tightness)
        } else {
            (
                GraspType::PrecisionGrip,
                0.5 * strength + 0.3 * average_curl + 0.2 * tightness,
            )
        }
    } else if average_curl > config.curl_threshold && closure < config.closure_threshold_px {
        (GraspType::PowerGrip, 0.7 * average_curl + 0.3 * tightness)
    } else if average_curl >= PARTIAL_CURL_FLOOR
        && closure < PARTIAL_CLOSURE_FACTOR * config.closure_threshold_px
    {
        let slack = 1.0 - closure / (PARTIAL_CLOSURE_FACTOR * config.closure_threshold_px);
        (
            GraspType::PartialGrasp,
            0.6 * average_curl + 0.4 * slack.clamp(0.0, 1.0),
        )
    } else if average_curl < PARTIAL_CURL_FLOOR
        && closure > OPEN_CLOSURE_FACTOR * config.closure_threshold_px
    {
        (GraspType::OpenPalm, OPEN_PALM_CONFIDENCE)
    } else {
        (GraspType::Unknown, 0.5 * average_curl)
    }
}

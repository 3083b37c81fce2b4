//! Hand assignment and pickup arbitration.
//!
//! Every frame builds an (objects x hands) pair-confidence matrix; each
//! object is analyzed against its best hand only. When several objects
//! qualify for pickup in the same frame, a composite score admits exactly
//! one.

use ndarray::Array2;

use super::detection::TrackingId;
use super::grasp::GraspAnalysis;
use super::object_state::{GRASP_WEIGHT, ObjectState, PROXIMITY_WEIGHT};
use super::proximity::ProximityAnalysis;

/// Arbitration weights, in descending order of influence.
const CLOSENESS_WEIGHT: f32 = 0.4;
const GRASP_SCORE_WEIGHT: f32 = 0.35;
const DETECTION_WEIGHT: f32 = 0.15;
const SMOOTHED_WEIGHT: f32 = 0.1;

/// One object that qualified for pickup this frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PickupCandidate {
    pub tracking_id: TrackingId,
    pub score: f32,
}

/// Pair confidence for every (object, hand) combination.
///
/// `proximities` is row-major: one inner vec per object, one entry per
/// hand. Returns a matrix of shape (objects, hands).
pub(crate) fn pair_scores(
    proximities: &[Vec<ProximityAnalysis>],
    grasps: &[GraspAnalysis],
) -> Array2<f32> {
    let mut scores = Array2::zeros((proximities.len(), grasps.len()));
    for (i, row) in proximities.iter().enumerate() {
        for (j, grasp) in grasps.iter().enumerate() {
            scores[[i, j]] =
                PROXIMITY_WEIGHT * row[j].confidence + GRASP_WEIGHT * grasp.confidence;
        }
    }
    scores
}

/// Index of the best-scoring hand for each object row, first wins ties.
/// Rows come back `None` only when there are no hands at all.
pub(crate) fn best_hand_per_object(scores: &Array2<f32>) -> Vec<Option<usize>> {
    let (rows, cols) = scores.dim();
    (0..rows)
        .map(|i| {
            let mut best: Option<(usize, f32)> = None;
            for j in 0..cols {
                let score = scores[[i, j]];
                if best.is_none_or(|(_, s)| score > s) {
                    best = Some((j, score));
                }
            }
            best.map(|(j, _)| j)
        })
        .collect()
}

/// Composite arbitration score for a pickup-eligible object.
///
/// Closeness maps the minimum fingertip distance onto [0, 1] against the
/// far radius, so nearer hands dominate; grasp quality, detector confidence
/// and the smoothed history break remaining ties.
pub(crate) fn score(state: &ObjectState, far_radius_px: f32) -> f32 {
    let closeness = state
        .proximity
        .map_or(0.0, |p| {
            1.0 - (p.min_fingertip_distance / far_radius_px).clamp(0.0, 1.0)
        });
    CLOSENESS_WEIGHT * closeness
        + GRASP_SCORE_WEIGHT * state.grasp_confidence()
        + DETECTION_WEIGHT * state.detection.confidence
        + SMOOTHED_WEIGHT * state.smoothed_confidence()
}

/// The single candidate admitted this frame, first wins ties.
pub(crate) fn select_winner(candidates: &[PickupCandidate]) -> Option<&PickupCandidate> {
    let mut winner: Option<&PickupCandidate> = None;
    for candidate in candidates {
        if winner.is_none_or(|w| candidate.score > w.score) {
            winner = Some(candidate);
        }
    }
    winner
}

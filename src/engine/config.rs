//! Engine configuration.

use serde::{Deserialize, Serialize};

use super::grasp::GraspConfig;
use super::proximity::ProximityConfig;

/// Tunable parameters for the pickup engine.
///
/// `Default` reproduces the stock behavior: 30 fps pacing, five carried
/// objects at most, a 3-frame confidence window and a 150 ms release dwell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum spacing between processed frames, in milliseconds. Frames
    /// arriving sooner are dropped whole.
    pub min_frame_interval_ms: f64,
    /// Cap on simultaneously carried objects.
    pub max_carried: usize,
    /// Grasp confidence a near-zone hand must exceed to trigger a pickup.
    pub pickup_grasp_floor: f32,
    /// Time targeting must stay broken before a carried object can release,
    /// in milliseconds.
    pub release_dwell_ms: f64,
    /// Smoothed confidence below which a disengaged carry releases.
    pub release_confidence_floor: f32,
    /// Number of recent frames averaged into the smoothed confidence.
    pub smoothing_window: usize,
    /// Idle time after which a non-carried state expires, in milliseconds.
    pub state_timeout_ms: f64,
    /// Unseen time after which a carried object is force-released and its
    /// state expires, in milliseconds.
    pub carried_timeout_ms: f64,
    pub proximity: ProximityConfig,
    pub grasp: GraspConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_frame_interval_ms: 33.0,
            max_carried: 5,
            pickup_grasp_floor: 0.2,
            release_dwell_ms: 150.0,
            release_confidence_floor: 0.3,
            smoothing_window: 3,
            state_timeout_ms: 5_000.0,
            carried_timeout_ms: 10_000.0,
            proximity: ProximityConfig::default(),
            grasp: GraspConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Check the configuration for contradictions before use.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_frame_interval_ms < 0.0 {
            return Err("min_frame_interval_ms must not be negative".into());
        }
        if self.max_carried == 0 {
            return Err("max_carried must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.pickup_grasp_floor) {
            return Err("pickup_grasp_floor must lie in [0, 1]".into());
        }
        if self.release_dwell_ms < 0.0 {
            return Err("release_dwell_ms must not be negative".into());
        }
        if !(0.0..=1.0).contains(&self.release_confidence_floor) {
            return Err("release_confidence_floor must lie in [0, 1]".into());
        }
        if self.smoothing_window == 0 {
            return Err("smoothing_window must be at least 1".into());
        }
        if self.state_timeout_ms <= 0.0 {
            return Err("state_timeout_ms must be positive".into());
        }
        if self.carried_timeout_ms < self.state_timeout_ms {
            return Err("carried_timeout_ms must not undercut state_timeout_ms".into());
        }
        self.proximity.validate()?;
        self.grasp.validate()?;
        Ok(())
    }
}

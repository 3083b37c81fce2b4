//! Hand-to-object proximity classification.
//!
//! Distances are measured in display pixels from the five fingertips to the
//! object's bounding-box center. The zone comes from the minimum fingertip
//! distance against three concentric radii, where the innermost radius grows
//! with the object's size. Confidence decays linearly within each band and
//! is modulated by how squarely the hand points at the object.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use super::landmark::{self, FINGERTIPS, LANDMARK_COUNT, MIDDLE_MCP, WRIST};
use super::rect::Rect;

const EPS: f32 = 1e-4;

/// Ring around an object a hand can occupy, ordered nearest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProximityZone {
    /// Within grabbing range.
    Near,
    /// Approaching, worth tracking closely.
    Close,
    /// In the neighborhood but not reaching.
    Far,
    /// Too distant to matter.
    #[default]
    Ignore,
}

impl ProximityZone {
    /// Rank with `Near` lowest, for monotonicity comparisons.
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            ProximityZone::Near => 0,
            ProximityZone::Close => 1,
            ProximityZone::Far => 2,
            ProximityZone::Ignore => 3,
        }
    }
}

/// Radii and modulation factors for zone classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    /// Base radius of the near zone, before size adjustment.
    pub near_radius_px: f32,
    /// Outer radius of the close zone.
    pub close_radius_px: f32,
    /// Outer radius of the far zone.
    pub far_radius_px: f32,
    /// Fraction of the object's longer side added to the near radius.
    pub size_adjust_factor: f32,
    /// Confidence multiplier applied in the close band.
    pub close_scale: f32,
    /// Confidence multiplier applied in the far band.
    pub far_scale: f32,
    /// Lower bound of the orientation factor.
    pub orientation_floor: f32,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            near_radius_px: 150.0,
            close_radius_px: 220.0,
            far_radius_px: 300.0,
            size_adjust_factor: 0.2,
            close_scale: 0.7,
            far_scale: 0.3,
            orientation_floor: 0.3,
        }
    }
}

impl ProximityConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.near_radius_px <= 0.0 {
            return Err("near_radius_px must be positive".into());
        }
        if self.close_radius_px <= self.near_radius_px {
            return Err("close_radius_px must exceed near_radius_px".into());
        }
        if self.far_radius_px <= self.close_radius_px {
            return Err("far_radius_px must exceed close_radius_px".into());
        }
        if self.size_adjust_factor < 0.0 {
            return Err("size_adjust_factor must not be negative".into());
        }
        for (name, value) in [
            ("close_scale", self.close_scale),
            ("far_scale", self.far_scale),
            ("orientation_floor", self.orientation_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must lie in [0, 1]"));
            }
        }
        Ok(())
    }
}

/// Result of classifying one hand against one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityAnalysis {
    pub zone: ProximityZone,
    /// Zone confidence in [0, 1] after distance decay and orientation.
    pub confidence: f32,
    /// Smallest fingertip-to-center distance, in pixels.
    pub min_fingertip_distance: f32,
    /// Mean fingertip-to-center distance, in pixels.
    pub avg_fingertip_distance: f32,
    /// Palm-center-to-center distance, in pixels.
    pub hand_center_distance: f32,
    /// Orientation factor in [orientation_floor, 1].
    pub orientation: f32,
}

impl ProximityAnalysis {
    /// Analysis for a hand that is absent or unusable.
    pub fn ignore() -> Self {
        Self {
            zone: ProximityZone::Ignore,
            confidence: 0.0,
            min_fingertip_distance: f32::INFINITY,
            avg_fingertip_distance: f32::INFINITY,
            hand_center_distance: f32::INFINITY,
            orientation: 0.0,
        }
    }
}

/// Classify a hand against an object's bounding box.
///
/// Landmarks are display-space points; anything but a complete hand yields
/// the ignore analysis.
pub fn analyze(
    bbox: &Rect,
    landmarks: &[Point2<f32>],
    config: &ProximityConfig,
) -> ProximityAnalysis {
    if landmarks.len() != LANDMARK_COUNT {
        return ProximityAnalysis::ignore();
    }
    let Some(palm) = landmark::palm_center(landmarks) else {
        return ProximityAnalysis::ignore();
    };

    let target = bbox.center();
    let tip_distances = FINGERTIPS.map(|i| (landmarks[i] - target).norm());
    let min_distance = tip_distances.iter().fold(f32::INFINITY, |a, &d| a.min(d));
    let avg_distance = tip_distances.iter().sum::<f32>() / tip_distances.len() as f32;
    let hand_center_distance = (palm - target).norm();

    let near_radius = config.near_radius_px + config.size_adjust_factor * bbox.max_dim();
    let orientation = orientation_factor(landmarks, target, config.orientation_floor);

    let (zone, base) = if min_distance <= near_radius {
        (ProximityZone::Near, 1.0 - min_distance / near_radius)
    } else if min_distance <= config.close_radius_px {
        let span = config.close_radius_px - near_radius;
        let decayed = 1.0 - (min_distance - near_radius) / span;
        (ProximityZone::Close, config.close_scale * decayed)
    } else if min_distance <= config.far_radius_px {
        let span = config.far_radius_px - config.close_radius_px;
        let decayed = 1.0 - (min_distance - config.close_radius_px) / span;
        (ProximityZone::Far, config.far_scale * decayed)
    } else {
        (ProximityZone::Ignore, 0.0)
    };

    ProximityAnalysis {
        zone,
        confidence: (base * orientation).clamp(0.0, 1.0),
        min_fingertip_distance: min_distance,
        avg_fingertip_distance: avg_distance,
        hand_center_distance,
        orientation,
    }
}

/// Cosine of the angle between the hand's pointing direction (wrist to
/// middle knuckle) and the direction to the object, rescaled into
/// [floor, 1]. Degenerate vectors score a neutral 1.0 so distance alone
/// decides.
fn orientation_factor(landmarks: &[Point2<f32>], target: Point2<f32>, floor: f32) -> f32 {
    let wrist = landmarks[WRIST];
    let pointing = landmarks[MIDDLE_MCP] - wrist;
    let to_target = target - wrist;
    let n1 = pointing.norm();
    let n2 = to_target.norm();
    if n1 <= EPS || n2 <= EPS {
        return 1.0;
    }
    let cosine = (pointing.dot(&to_target) / (n1 * n2)).clamp(-1.0, 1.0);
    floor + (cosine + 1.0) / 2.0 * (1.0 - floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// All 21 landmarks collapsed onto one point: distances are exact and
    /// the orientation factor stays neutral.
    fn point_hand(x: f32, y: f32) -> Vec<Point2<f32>> {
        vec![Point2::new(x, y); LANDMARK_COUNT]
    }

    fn config() -> ProximityConfig {
        ProximityConfig::default()
    }

    #[test]
    fn test_zone_thresholds() {
        // 60x60 box at the origin-centered rect: adjusted near radius is
        // 150 + 0.2 * 60 = 162.
        let bbox = Rect::from_center(Point2::new(320.0, 240.0), 60.0, 60.0);
        let cases = [
            (100.0, ProximityZone::Near),
            (162.0, ProximityZone::Near),
            (200.0, ProximityZone::Close),
            (220.0, ProximityZone::Close),
            (260.0, ProximityZone::Far),
            (300.0, ProximityZone::Far),
            (301.0, ProximityZone::Ignore),
        ];
        for (distance, expected) in cases {
            let hand = point_hand(320.0 + distance, 240.0);
            let analysis = analyze(&bbox, &hand, &config());
            assert_eq!(analysis.zone, expected, "distance {distance}");
            assert!((analysis.min_fingertip_distance - distance).abs() < 1e-3);
        }
    }

    #[test]
    fn test_confidence_decays_within_band() {
        let bbox = Rect::from_center(Point2::new(0.0, 0.0), 60.0, 60.0);
        let near = analyze(&bbox, &point_hand(10.0, 0.0), &config());
        let farther = analyze(&bbox, &point_hand(100.0, 0.0), &config());
        assert_eq!(near.zone, ProximityZone::Near);
        assert_eq!(farther.zone, ProximityZone::Near);
        assert!(near.confidence > farther.confidence);

        // Dead center scores the full band confidence.
        let centered = analyze(&bbox, &point_hand(0.0, 0.0), &config());
        assert!((centered.confidence - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_band_scales_cap_confidence() {
        let bbox = Rect::from_center(Point2::new(0.0, 0.0), 60.0, 60.0);
        // Just inside the close band.
        let close = analyze(&bbox, &point_hand(163.0, 0.0), &config());
        assert_eq!(close.zone, ProximityZone::Close);
        assert!(close.confidence <= config().close_scale + 1e-4);
        // Just inside the far band.
        let far = analyze(&bbox, &point_hand(221.0, 0.0), &config());
        assert_eq!(far.zone, ProximityZone::Far);
        assert!(far.confidence <= config().far_scale + 1e-4);
    }

    #[test]
    fn test_zone_never_regresses_as_hand_approaches() {
        let bbox = Rect::from_center(Point2::new(320.0, 240.0), 80.0, 40.0);
        let mut last_rank = u8::MAX;
        let mut distance = 400.0;
        while distance >= 0.0 {
            let hand = point_hand(320.0 + distance, 240.0);
            let rank = analyze(&bbox, &hand, &config()).zone.rank();
            assert!(
                rank <= last_rank,
                "zone regressed at distance {distance}: rank {rank} after {last_rank}"
            );
            last_rank = rank;
            distance -= 2.5;
        }
        assert_eq!(last_rank, ProximityZone::Near.rank());
    }

    #[test]
    fn test_orientation_rewards_pointing_at_object() {
        let target = Point2::new(100.0, 0.0);
        let floor = 0.3;

        // Wrist at origin, knuckle toward the target.
        let mut toward = point_hand(0.0, 0.0);
        toward[MIDDLE_MCP] = Point2::new(50.0, 0.0);
        let score = orientation_factor(&toward, target, floor);
        assert!((score - 1.0).abs() < 1e-4);

        // Knuckle pointing the opposite way.
        let mut away = point_hand(0.0, 0.0);
        away[MIDDLE_MCP] = Point2::new(-50.0, 0.0);
        let score = orientation_factor(&away, target, floor);
        assert!((score - floor).abs() < 1e-4);

        // Perpendicular lands midway.
        let mut side = point_hand(0.0, 0.0);
        side[MIDDLE_MCP] = Point2::new(0.0, 50.0);
        let score = orientation_factor(&side, target, floor);
        assert!((score - (floor + (1.0 - floor) / 2.0)).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_orientation_is_neutral() {
        // Wrist and knuckle coincide.
        let hand = point_hand(10.0, 10.0);
        let score = orientation_factor(&hand, Point2::new(200.0, 200.0), 0.3);
        assert_eq!(score, 1.0);
        // Hand sitting exactly on the target.
        let score = orientation_factor(&hand, Point2::new(10.0, 10.0), 0.3);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_size_adjustment_extends_near_zone() {
        let small = Rect::from_center(Point2::new(0.0, 0.0), 20.0, 20.0);
        let large = Rect::from_center(Point2::new(0.0, 0.0), 400.0, 100.0);
        let hand = point_hand(170.0, 0.0);
        // 170 > 150 + 0.2*20 = 154 but <= 150 + 0.2*400 = 230.
        assert_eq!(analyze(&small, &hand, &config()).zone, ProximityZone::Close);
        assert_eq!(analyze(&large, &hand, &config()).zone, ProximityZone::Near);
    }

    #[test]
    fn test_incomplete_hand_is_ignored() {
        let bbox = Rect::from_center(Point2::new(0.0, 0.0), 60.0, 60.0);
        let analysis = analyze(&bbox, &[Point2::new(0.0, 0.0); 5], &config());
        assert_eq!(analysis.zone, ProximityZone::Ignore);
        assert_eq!(analysis.confidence, 0.0);
        assert!(analysis.min_fingertip_distance.is_infinite());
    }

    #[test]
    fn test_default_config_validates() {
        assert!(ProximityConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_unordered_radii() {
        let mut cfg = ProximityConfig::default();
        cfg.close_radius_px = cfg.near_radius_px;
        assert!(cfg.validate().is_err());

        let mut cfg = ProximityConfig::default();
        cfg.far_radius_px = 10.0;
        assert!(cfg.validate().is_err());
    }
}

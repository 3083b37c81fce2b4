//! Mapping from normalized sensor coordinates to display-surface pixels.
//!
//! The sensor image is fitted to the display surface with a uniform scale
//! (aspect ratio preserved) and centered, so unused display area becomes
//! symmetric letterbox bars. All downstream geometry runs in display pixels.

use nalgebra::{Point2, Vector2};
use thiserror::Error;

use super::landmark::{self, HandFrame, LANDMARK_COUNT, ProjectedHand};

/// Slack beyond the surface edges before a hand is rejected, in pixels.
const BOUNDS_TOLERANCE_PX: f32 = 10.0;

/// Below this norm a normalized landmark set counts as trivial, so a palm
/// collapsing onto the origin is garbage input rather than a mapping failure.
const TRIVIAL_NORM: f32 = 1e-3;

/// Radius around the display origin treated as a collapsed projection.
const COLLAPSE_RADIUS_PX: f32 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("coordinate context has non-positive dimensions")]
    InvalidContext,
    #[error("hand landmark list is empty")]
    EmptyLandmarks,
    #[error("expected {expected} hand landmarks, got {got}")]
    LandmarkCount { expected: usize, got: usize },
    #[error("projected palm center collapsed onto the display origin")]
    OriginCollapse,
    #[error("projected palm center ({x:.1}, {y:.1}) lies outside the display surface")]
    OutOfBounds { x: f32, y: f32 },
}

/// Projects normalized sensor coordinates into display pixels.
#[derive(Debug, Clone, Copy)]
pub struct ViewTransform {
    sensor: Vector2<f32>,
    surface: Vector2<f32>,
    scale: f32,
    offset: Vector2<f32>,
}

impl ViewTransform {
    /// Build a transform for the given sensor and display-surface sizes,
    /// both in pixels as (width, height).
    pub fn new(
        sensor_size: (f32, f32),
        surface_size: (f32, f32),
    ) -> Result<Self, TransformError> {
        let (sw, sh) = sensor_size;
        let (dw, dh) = surface_size;
        if sw <= 0.0 || sh <= 0.0 || dw <= 0.0 || dh <= 0.0 {
            return Err(TransformError::InvalidContext);
        }
        let scale = (dw / sw).min(dh / sh);
        let offset = Vector2::new((dw - sw * scale) / 2.0, (dh - sh * scale) / 2.0);
        Ok(Self {
            sensor: Vector2::new(sw, sh),
            surface: Vector2::new(dw, dh),
            scale,
            offset,
        })
    }

    /// Uniform sensor-to-surface scale factor.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Letterbox offset applied after scaling, in pixels.
    #[inline]
    pub fn offset(&self) -> (f32, f32) {
        (self.offset.x, self.offset.y)
    }

    /// Display surface size as (width, height).
    #[inline]
    pub fn surface_size(&self) -> (f32, f32) {
        (self.surface.x, self.surface.y)
    }

    /// Project one normalized sensor point into display pixels.
    #[inline]
    pub fn project_point(&self, point: Point2<f32>) -> Point2<f32> {
        Point2::new(
            point.x * self.sensor.x * self.scale + self.offset.x,
            point.y * self.sensor.y * self.scale + self.offset.y,
        )
    }

    /// Project a full hand into display pixels, validating the result.
    ///
    /// Rejects incomplete landmark sets, projections that collapse onto the
    /// display origin despite non-trivial input, and hands whose palm center
    /// lands outside the surface (with a small tolerance band).
    pub fn project_hand(&self, hand: &HandFrame) -> Result<ProjectedHand, TransformError> {
        if hand.landmarks.is_empty() {
            return Err(TransformError::EmptyLandmarks);
        }
        if hand.landmarks.len() != LANDMARK_COUNT {
            return Err(TransformError::LandmarkCount {
                expected: LANDMARK_COUNT,
                got: hand.landmarks.len(),
            });
        }

        let mut points = [Point2::new(0.0, 0.0); LANDMARK_COUNT];
        for (out, src) in points.iter_mut().zip(&hand.landmarks) {
            *out = self.project_point(*src);
        }

        // Complete set, so the centroid exists.
        let palm_center = match landmark::palm_center(&points) {
            Some(p) => p,
            None => return Err(TransformError::EmptyLandmarks),
        };
        self.validate_palm(palm_center, &hand.landmarks)?;

        Ok(ProjectedHand {
            points,
            palm_center,
            handedness: hand.handedness,
            confidence: hand.confidence,
        })
    }

    fn validate_palm(
        &self,
        palm: Point2<f32>,
        input: &[Point2<f32>],
    ) -> Result<(), TransformError> {
        let collapsed = palm.coords.norm() < COLLAPSE_RADIUS_PX;
        let trivial_input = input.iter().all(|p| p.coords.norm() < TRIVIAL_NORM);
        if collapsed && !trivial_input {
            return Err(TransformError::OriginCollapse);
        }
        if palm.x < -BOUNDS_TOLERANCE_PX
            || palm.y < -BOUNDS_TOLERANCE_PX
            || palm.x > self.surface.x + BOUNDS_TOLERANCE_PX
            || palm.y > self.surface.y + BOUNDS_TOLERANCE_PX
        {
            return Err(TransformError::OutOfBounds {
                x: palm.x,
                y: palm.y,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::landmark::Handedness;

    fn uniform_hand(x: f32, y: f32) -> HandFrame {
        HandFrame::new(vec![Point2::new(x, y); LANDMARK_COUNT], Handedness::Right)
    }

    #[test]
    fn test_identity_like_mapping() {
        let vt = ViewTransform::new((640.0, 480.0), (640.0, 480.0)).unwrap();
        assert_eq!(vt.scale(), 1.0);
        assert_eq!(vt.offset(), (0.0, 0.0));
        let p = vt.project_point(Point2::new(0.5, 0.5));
        assert_eq!(p, Point2::new(320.0, 240.0));
    }

    #[test]
    fn test_uniform_downscale() {
        let vt = ViewTransform::new((640.0, 480.0), (320.0, 240.0)).unwrap();
        assert_eq!(vt.scale(), 0.5);
        assert_eq!(vt.offset(), (0.0, 0.0));
        assert_eq!(vt.project_point(Point2::new(1.0, 1.0)), Point2::new(320.0, 240.0));
    }

    #[test]
    fn test_letterbox_is_centered() {
        // Square surface over a 4:3 sensor: vertical bars of 80px each.
        let vt = ViewTransform::new((640.0, 480.0), (640.0, 640.0)).unwrap();
        assert_eq!(vt.scale(), 1.0);
        assert_eq!(vt.offset(), (0.0, 80.0));
        assert_eq!(vt.project_point(Point2::new(0.5, 0.5)), Point2::new(320.0, 320.0));
        assert_eq!(vt.project_point(Point2::new(0.0, 0.0)), Point2::new(0.0, 80.0));
    }

    #[test]
    fn test_portrait_surface() {
        let vt = ViewTransform::new((640.0, 480.0), (360.0, 640.0)).unwrap();
        assert!((vt.scale() - 0.5625).abs() < 1e-6);
        let (ox, oy) = vt.offset();
        assert!((ox - 0.0).abs() < 1e-6);
        assert!((oy - 185.0).abs() < 1e-6);
        let bottom_right = vt.project_point(Point2::new(1.0, 1.0));
        assert!((bottom_right.x - 360.0).abs() < 1e-4);
        assert!((bottom_right.y - 455.0).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_degenerate_context() {
        assert_eq!(
            ViewTransform::new((0.0, 480.0), (640.0, 480.0)).unwrap_err(),
            TransformError::InvalidContext
        );
        assert_eq!(
            ViewTransform::new((640.0, 480.0), (640.0, -1.0)).unwrap_err(),
            TransformError::InvalidContext
        );
    }

    #[test]
    fn test_rejects_empty_and_partial_hands() {
        let vt = ViewTransform::new((640.0, 480.0), (640.0, 480.0)).unwrap();
        let empty = HandFrame::new(Vec::new(), Handedness::Unknown);
        assert_eq!(
            vt.project_hand(&empty).unwrap_err(),
            TransformError::EmptyLandmarks
        );

        let partial = HandFrame::new(vec![Point2::new(0.5, 0.5); 15], Handedness::Left);
        assert_eq!(
            vt.project_hand(&partial).unwrap_err(),
            TransformError::LandmarkCount {
                expected: LANDMARK_COUNT,
                got: 15
            }
        );
    }

    #[test]
    fn test_rejects_palm_outside_surface() {
        let vt = ViewTransform::new((640.0, 480.0), (640.0, 480.0)).unwrap();
        let hand = uniform_hand(1.2, 0.5);
        match vt.project_hand(&hand) {
            Err(TransformError::OutOfBounds { x, .. }) => assert!(x > 640.0),
            other => panic!("expected out-of-bounds rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_edge_palm_within_tolerance_is_accepted() {
        let vt = ViewTransform::new((640.0, 480.0), (640.0, 480.0)).unwrap();
        // Palm exactly on the right edge: inside the tolerance band.
        let hand = uniform_hand(1.0, 0.5);
        assert!(vt.project_hand(&hand).is_ok());
    }

    #[test]
    fn test_origin_collapse_detected() {
        let vt = ViewTransform::new((640.0, 480.0), (640.0, 480.0)).unwrap();
        let input = vec![Point2::new(0.4, 0.6); LANDMARK_COUNT];
        let err = vt.validate_palm(Point2::new(0.0, 0.0), &input);
        assert_eq!(err, Err(TransformError::OriginCollapse));
    }

    #[test]
    fn test_trivial_input_is_not_a_collapse() {
        let vt = ViewTransform::new((640.0, 480.0), (640.0, 480.0)).unwrap();
        let input = vec![Point2::new(0.0, 0.0); LANDMARK_COUNT];
        assert!(vt.validate_palm(Point2::new(0.0, 0.0), &input).is_ok());
    }

    #[test]
    fn test_projected_hand_carries_metadata() {
        let vt = ViewTransform::new((640.0, 480.0), (640.0, 480.0)).unwrap();
        let hand = uniform_hand(0.5, 0.5).with_confidence(0.9);
        let projected = vt.project_hand(&hand).unwrap();
        assert_eq!(projected.handedness, Handedness::Right);
        assert!((projected.confidence - 0.9).abs() < 1e-6);
        assert!((projected.palm_center.x - 320.0).abs() < 1e-4);
        assert!((projected.palm_center.y - 240.0).abs() < 1e-4);
    }
}

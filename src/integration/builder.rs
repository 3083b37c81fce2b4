//! Builder for creating `ObjectDetection` values from various input formats.

use crate::engine::{ObjectDetection, Rect, TrackingId};

/// Builder for creating [`ObjectDetection`] values from the box formats
/// detectors commonly emit.
///
/// Confidence defaults to 1.0 for callers whose detector has already
/// thresholded its output.
#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    tracking_id: TrackingId,
    label: String,
    bbox: Rect,
    confidence: f32,
}

impl DetectionBuilder {
    /// Create a new detection builder for one tracked object.
    pub fn new(tracking_id: impl Into<TrackingId>, label: impl Into<String>) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            label: label.into(),
            bbox: Rect::default(),
            confidence: 1.0,
        }
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.bbox = Rect::from_tlbr(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::from_center(nalgebra::Point2::new(cx, cy), w, h);
        self
    }

    /// Set bounding box in TLWH format (top-left x, top-left y, width, height).
    pub fn tlwh(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.bbox = Rect::new(x, y, w, h);
        self
    }

    /// Set the detector confidence.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Build the final [`ObjectDetection`].
    pub fn build(self) -> ObjectDetection {
        ObjectDetection {
            tracking_id: self.tracking_id,
            label: self.label,
            bbox: self.bbox,
            confidence: self.confidence,
        }
    }
}

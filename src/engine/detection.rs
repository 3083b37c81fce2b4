//! Input types delivered by the upstream detector and landmark tracker.

use std::fmt;

use super::landmark::HandFrame;
use super::rect::Rect;

/// Stable identity assigned to an object by the upstream detector's tracker.
///
/// The engine never invents identities; it keys all state on the ids the
/// detector hands it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackingId(String);

impl TrackingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackingId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for TrackingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One detected object in one frame, already in display pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDetection {
    pub tracking_id: TrackingId,
    /// Detector class label, e.g. "bottle" or "cup".
    pub label: String,
    pub bbox: Rect,
    /// Detector confidence in [0, 1].
    pub confidence: f32,
}

impl ObjectDetection {
    pub fn new(
        tracking_id: impl Into<TrackingId>,
        label: impl Into<String>,
        bbox: Rect,
        confidence: f32,
    ) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            label: label.into(),
            bbox,
            confidence,
        }
    }
}

/// Everything the engine consumes for one frame.
///
/// `timestamp_ms` is the caller's clock. The engine never reads wall time,
/// which keeps frame pacing, dwell and expiry deterministic under test.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub timestamp_ms: f64,
    pub detections: Vec<ObjectDetection>,
    pub hands: Vec<HandFrame>,
}

impl FrameInput {
    pub fn new(timestamp_ms: f64) -> Self {
        Self {
            timestamp_ms,
            detections: Vec::new(),
            hands: Vec::new(),
        }
    }

    pub fn with_detections(mut self, detections: Vec<ObjectDetection>) -> Self {
        self.detections = detections;
        self
    }

    pub fn with_hands(mut self, hands: Vec<HandFrame>) -> Self {
        self.hands = hands;
        self
    }
}

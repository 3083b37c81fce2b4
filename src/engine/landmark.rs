//! Hand landmark topology shared by the proximity and grasp analyzers.
//!
//! Landmarks follow the standard 21-point hand model: wrist at index 0,
//! then four joints per finger from base to tip (thumb 1-4, index 5-8,
//! middle 9-12, ring 13-16, pinky 17-20).

use nalgebra::Point2;

use super::rect::Rect;

/// Number of landmarks in a complete hand.
pub const LANDMARK_COUNT: usize = 21;

/// Wrist landmark index.
pub const WRIST: usize = 0;
/// Thumb tip landmark index.
pub const THUMB_TIP: usize = 4;
/// Index finger base knuckle.
pub const INDEX_MCP: usize = 5;
/// Index finger tip.
pub const INDEX_TIP: usize = 8;
/// Middle finger base knuckle.
pub const MIDDLE_MCP: usize = 9;
/// Middle finger tip.
pub const MIDDLE_TIP: usize = 12;
/// Ring finger base knuckle.
pub const RING_MCP: usize = 13;
/// Ring finger tip.
pub const RING_TIP: usize = 16;
/// Pinky base knuckle.
pub const PINKY_MCP: usize = 17;
/// Pinky tip.
pub const PINKY_TIP: usize = 20;

/// The five fingertip indices, thumb first.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Landmarks whose centroid approximates the palm center: the wrist plus
/// the four non-thumb base knuckles.
pub const PALM_ANCHORS: [usize; 5] = [WRIST, INDEX_MCP, MIDDLE_MCP, RING_MCP, PINKY_MCP];

/// One of the five fingers, usable as an index into per-finger arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

impl Finger {
    /// All fingers in landmark order.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Landmark indices of this finger's joints, base to tip.
    #[inline]
    pub fn joint_chain(&self) -> [usize; 4] {
        match self {
            Finger::Thumb => [1, 2, 3, 4],
            Finger::Index => [5, 6, 7, 8],
            Finger::Middle => [9, 10, 11, 12],
            Finger::Ring => [13, 14, 15, 16],
            Finger::Pinky => [17, 18, 19, 20],
        }
    }

    /// Landmark index of this finger's tip.
    #[inline]
    pub fn tip(&self) -> usize {
        self.joint_chain()[3]
    }
}

/// Which hand a landmark set belongs to, as reported by the upstream tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

/// One hand as delivered by the landmark tracker, in normalized sensor
/// coordinates ([0, 1] on both axes, origin at the sensor's top-left).
///
/// Points may fall slightly outside [0, 1] when the hand is partially out
/// of frame; the coordinate transform tolerates that.
#[derive(Debug, Clone)]
pub struct HandFrame {
    /// Normalized landmark positions, `LANDMARK_COUNT` entries when complete.
    pub landmarks: Vec<Point2<f32>>,
    pub handedness: Handedness,
    /// Tracker confidence in the handedness label.
    pub handedness_confidence: f32,
    /// Tracker confidence in the landmark set as a whole.
    pub confidence: f32,
}

impl HandFrame {
    pub fn new(landmarks: Vec<Point2<f32>>, handedness: Handedness) -> Self {
        Self {
            landmarks,
            handedness,
            handedness_confidence: 1.0,
            confidence: 1.0,
        }
    }

    /// Parse a flat `[x0, y0, x1, y1, ..]` buffer as emitted by most
    /// landmark trackers. Returns `None` unless exactly `LANDMARK_COUNT`
    /// coordinate pairs are present.
    pub fn from_flat(coords: &[f32], handedness: Handedness) -> Option<Self> {
        if coords.len() != LANDMARK_COUNT * 2 {
            return None;
        }
        let landmarks = coords
            .chunks_exact(2)
            .map(|xy| Point2::new(xy[0], xy[1]))
            .collect();
        Some(Self::new(landmarks, handedness))
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }
}

/// A hand after projection onto the display surface, in pixels.
#[derive(Debug, Clone)]
pub struct ProjectedHand {
    /// All 21 landmarks in display pixels.
    pub points: [Point2<f32>; LANDMARK_COUNT],
    /// Centroid of the palm anchor landmarks, validated during projection.
    pub palm_center: Point2<f32>,
    pub handedness: Handedness,
    pub confidence: f32,
}

impl ProjectedHand {
    /// All landmarks as a slice, for the analyzers.
    #[inline]
    pub fn landmarks(&self) -> &[Point2<f32>] {
        &self.points
    }

    /// Display position of one fingertip.
    #[inline]
    pub fn fingertip(&self, finger: Finger) -> Point2<f32> {
        self.points[finger.tip()]
    }

    /// Axis-aligned box around the projected landmarks.
    pub fn bounds(&self) -> Rect {
        let mut min = self.points[0];
        let mut max = self.points[0];
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Rect::from_tlbr(min.x, min.y, max.x, max.y)
    }
}

/// Centroid of the palm anchor landmarks, or `None` for an incomplete set.
pub fn palm_center(points: &[Point2<f32>]) -> Option<Point2<f32>> {
    if points.len() != LANDMARK_COUNT {
        return None;
    }
    let mut x = 0.0;
    let mut y = 0.0;
    for &i in &PALM_ANCHORS {
        x += points[i].x;
        y += points[i].y;
    }
    let n = PALM_ANCHORS.len() as f32;
    Some(Point2::new(x / n, y / n))
}

/// Lifecycle phase of a tracked object relative to the user's hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackPhase {
    /// Visible, no hand engagement.
    #[default]
    Detected,
    /// A hand is within grabbing range.
    Targeted,
    /// Picked up and moving with a hand.
    Carried,
    /// Put back down after being carried.
    Released,
}

impl TrackPhase {
    /// Whether the object is currently in a hand.
    #[inline]
    pub fn is_carried(&self) -> bool {
        matches!(self, TrackPhase::Carried)
    }
}

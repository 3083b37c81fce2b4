//! Hand-to-object pickup detection over detector tracks and hand landmarks.
//!
//! Feed per-frame object detections and 21-point hand landmark sets into a
//! [`PickupEngine`](engine::PickupEngine) and read back which objects are
//! being targeted, picked up and released. The engine owns no capture or
//! inference; it consumes the output of any detector/landmark pipeline and
//! publishes its decisions as queryable state and as channel events.

pub mod engine;
pub mod integration;

mod error;

pub use engine::{
    EngineConfig, EngineEvent, EngineStats, FrameInput, FrameOutcome, FrameReport, GraspType,
    HandFrame, Handedness, ObjectDetection, ObjectState, PickupEngine, PickupEvent, ProximityZone,
    Rect, ReleaseEvent, TrackPhase, TrackingId, ViewTransform,
};
pub use error::EngineError;

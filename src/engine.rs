mod candidate;
mod config;
mod detection;
mod events;
pub mod grasp;
pub mod landmark;
mod object_state;
mod phase;
mod pickup;
pub mod proximity;
mod rect;
mod viewport;

pub use config::EngineConfig;
pub use detection::{FrameInput, ObjectDetection, TrackingId};
pub use events::{EngineEvent, EventSink, PickupEvent, ReleaseEvent};
pub use grasp::{GraspAnalysis, GraspConfig, GraspType};
pub use landmark::{HandFrame, Handedness, ProjectedHand};
pub use object_state::ObjectState;
pub use phase::TrackPhase;
pub use pickup::{EngineStats, FrameOutcome, FrameReport, PickupEngine};
pub use proximity::{ProximityAnalysis, ProximityConfig, ProximityZone};
pub use rect::Rect;
pub use viewport::{TransformError, ViewTransform};

//! Integration module for connecting perception feeds and stores to the engine.
//!
//! This module provides traits and utilities for feeding frames from any
//! detector/landmark pipeline into [`PickupEngine`](crate::engine::PickupEngine)
//! and for relaying its events into inventory systems.

mod builder;
mod inventory;
mod source;

pub use builder::DetectionBuilder;
pub use inventory::{InventoryRelay, InventoryStore, RetryPolicy};
pub use source::{FrameSource, PickupSession};

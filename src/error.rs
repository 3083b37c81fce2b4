//! Crate-level error types.

use thiserror::Error;

use crate::engine::TransformError;

/// Errors surfaced by the pickup engine's own API.
///
/// Per-frame input problems (bad hands, missing context) are downgraded to
/// skips inside [`process_frame`](crate::engine::PickupEngine::process_frame)
/// and never abort a frame.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("coordinate context rejected: {0}")]
    Context(#[from] TransformError),
}

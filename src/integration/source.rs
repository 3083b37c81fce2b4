//! Frame source trait and session loop.

use crate::engine::{FrameInput, FrameReport, PickupEngine};

/// Trait for upstream frame producers.
///
/// Implement this to feed the engine from any camera or replay pipeline.
///
/// # Example
///
/// ```ignore
/// use grasptrack_rs::FrameInput;
/// use grasptrack_rs::integration::FrameSource;
///
/// struct Replay {
///     frames: Vec<FrameInput>,
/// }
///
/// impl FrameSource for Replay {
///     type Error = std::io::Error;
///
///     fn next_frame(&mut self) -> Result<Option<FrameInput>, Self::Error> {
///         // Decode the next frame, or Ok(None) at end of stream
///         Ok(None)
///     }
/// }
/// ```
pub trait FrameSource {
    /// Error type for frame acquisition failures.
    type Error;

    /// Produce the next frame, or `Ok(None)` when the stream has ended.
    fn next_frame(&mut self) -> Result<Option<FrameInput>, Self::Error>;
}

/// A frame source bundled with an engine, pumped one frame at a time.
pub struct PickupSession<S: FrameSource> {
    source: S,
    engine: PickupEngine,
}

impl<S: FrameSource> PickupSession<S> {
    /// Create a session over the given source and engine.
    pub fn new(source: S, engine: PickupEngine) -> Self {
        Self { source, engine }
    }

    /// Pull one frame from the source and process it.
    ///
    /// Returns `Ok(None)` once the source is exhausted.
    pub fn pump(&mut self) -> Result<Option<FrameReport>, S::Error> {
        match self.source.next_frame()? {
            Some(frame) => Ok(Some(self.engine.process_frame(frame))),
            None => Ok(None),
        }
    }

    /// Pump frames until the source ends, returning how many were delivered.
    pub fn run_to_end(&mut self) -> Result<u64, S::Error> {
        let mut frames = 0;
        while self.pump()?.is_some() {
            frames += 1;
        }
        Ok(frames)
    }

    /// Get a reference to the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the underlying source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Get a reference to the underlying engine.
    pub fn engine(&self) -> &PickupEngine {
        &self.engine
    }

    /// Get a mutable reference to the underlying engine.
    pub fn engine_mut(&mut self) -> &mut PickupEngine {
        &mut self.engine
    }

    /// Tear down the session, keeping the engine.
    pub fn into_engine(self) -> PickupEngine {
        self.engine
    }
}

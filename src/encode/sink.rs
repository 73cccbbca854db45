use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameGeometry, FrameIndex, FrameRGBA};
use crate::foundation::error::{StillreelError, StillreelResult};

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// File the sink writes.
    pub out_path: PathBuf,
    /// Dimensions of every frame.
    pub geometry: FrameGeometry,
    /// Nominal output frame rate.
    pub fps: Fps,
}

/// Sink contract for consuming frames in output order.
///
/// Ordering contract: `push_frame` is called with strictly increasing `FrameIndex` values,
/// starting at 0. `end` is called exactly once after `begin` succeeded, on success and failure
/// paths alike.
pub trait FrameSink: Send {
    /// Open the output. Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> StillreelResult<()>;
    /// Append one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StillreelResult<()>;
    /// Flush and close the output.
    fn end(&mut self) -> StillreelResult<()>;
}

/// Creates a fresh sink for each job.
pub trait SinkFactory: Send + Sync {
    /// Build an unopened sink.
    fn create(&self) -> Box<dyn FrameSink>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` has been called since the last `begin`.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> StillreelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> StillreelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| StillreelError::encode("in-memory sink not started"))?;
        if frame.geometry() != cfg.geometry {
            return Err(StillreelError::encode(format!(
                "frame size mismatch: got {}, expected {}",
                frame.geometry(),
                cfg.geometry
            )));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> StillreelResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;

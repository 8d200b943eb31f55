use thiserror::Error;

use crate::shared::frame::{PixelFormat, RawFrame};

#[derive(Error, Debug)]
pub enum SourceError {
    /// The capture device (or file source) has no frame ready. The scheduler
    /// skips the cycle; the next tick retries naturally.
    #[error("frame source is not ready")]
    FrameUnavailable,
    #[error("failed to read frame data: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode frame: {0}")]
    Decode(String),
}

/// Produces one frame snapshot on demand, already scaled to the requested
/// resolution and converted to the requested pixel format.
///
/// Scaling is the source's job (nearest-neighbor or an equivalently
/// deterministic interpolation); the analysis chain never resizes.
pub trait FrameSource: Send {
    fn acquire_frame(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<RawFrame, SourceError>;
}

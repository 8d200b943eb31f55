use std::path::{Path, PathBuf};

use crate::io::domain::frame_source::{FrameSource, SourceError};
use crate::shared::frame::{PixelFormat, RawFrame};

/// Adapts a single still image to the [`FrameSource`] interface.
///
/// Every acquisition decodes the file fresh, scales it to the requested
/// resolution with nearest-neighbor interpolation, and converts to the
/// requested pixel format.
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSource for ImageFileSource {
    fn acquire_frame(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<RawFrame, SourceError> {
        decode_frame_file(&self.path, format, width, height)
    }
}

/// Decodes `path` into a frame at exactly `width`×`height` in `format`.
///
/// A missing file maps to `FrameUnavailable` (the source isn't ready), any
/// other decode problem to `Decode`.
pub(crate) fn decode_frame_file(
    path: &Path,
    format: PixelFormat,
    width: u32,
    height: u32,
) -> Result<RawFrame, SourceError> {
    if !path.exists() {
        return Err(SourceError::FrameUnavailable);
    }

    let decoded = image::open(path).map_err(|e| SourceError::Decode(e.to_string()))?;
    let resized = decoded.resize_exact(width, height, image::imageops::FilterType::Nearest);
    let mut data = resized.to_rgba8().into_raw();

    if format == PixelFormat::Bgra8 {
        for px in data.chunks_exact_mut(PixelFormat::BYTES_PER_PIXEL) {
            px.swap(0, 2);
        }
    }

    Ok(RawFrame::new(data, width, height, format))
}

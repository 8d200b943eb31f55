use crate::shared::frame::{CompositeImage, PixelFormat, RawFrame};

/// The scheduler's analyzer port: one frame in, one finished composite out.
///
/// This is the seam that keeps the sampling loop analyzer-agnostic: a
/// different model (e.g. a box-drawing face tracker) slots in here without
/// touching the scheduler. Implementations may be stateful, hence
/// `&mut self`.
pub trait FrameAnalyzer: Send {
    /// Runs the full preprocess → inference → postprocess chain on one frame.
    fn analyze(&mut self, frame: &RawFrame) -> Result<CompositeImage, Box<dyn std::error::Error>>;

    /// The frame resolution this analyzer expects from the source.
    fn input_size(&self) -> (u32, u32);

    /// The pixel format this analyzer expects from the source.
    fn pixel_format(&self) -> PixelFormat;
}

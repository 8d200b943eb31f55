use crate::io::domain::frame_source::FrameSource;
use crate::io::domain::presenter::Presenter;
use crate::pipeline::frame_analyzer::FrameAnalyzer;

/// Single-image pipeline: acquire → analyze → present, once.
///
/// The one-shot counterpart of the scheduler's periodic cycle, used for
/// processing a still image without a timer.
pub struct AnalyzeImageUseCase {
    source: Box<dyn FrameSource>,
    analyzer: Box<dyn FrameAnalyzer>,
    presenter: Box<dyn Presenter>,
}

impl AnalyzeImageUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        analyzer: Box<dyn FrameAnalyzer>,
        presenter: Box<dyn Presenter>,
    ) -> Self {
        Self {
            source,
            analyzer,
            presenter,
        }
    }

    pub fn execute(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (width, height) = self.analyzer.input_size();
        let format = self.analyzer.pixel_format();

        let frame = self.source.acquire_frame(format, width, height)?;
        let image = self.analyzer.analyze(&frame)?;
        self.presenter.present(image)?;

        Ok(())
    }
}

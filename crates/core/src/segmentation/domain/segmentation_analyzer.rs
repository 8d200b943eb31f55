use crate::pipeline::frame_analyzer::FrameAnalyzer;
use crate::segmentation::domain::inference_engine::{InferenceEngine, InferenceError};
use crate::segmentation::domain::mask_compositor::MaskCompositor;
use crate::segmentation::domain::tensor_encoder::TensorEncoder;
use crate::shared::constants::PRIMARY_OUTPUT_NAME;
use crate::shared::frame::{CompositeImage, PixelFormat, RawFrame};

/// Background-segmentation analyzer: encode → evaluate → composite.
///
/// The model emits seven multi-scale masks; only the finest (`o0`) is
/// blended. The rest stay available through the engine for debugging but are
/// not consumed here.
pub struct SegmentationAnalyzer {
    encoder: TensorEncoder,
    engine: Box<dyn InferenceEngine>,
    compositor: MaskCompositor,
}

impl SegmentationAnalyzer {
    pub fn new(
        encoder: TensorEncoder,
        engine: Box<dyn InferenceEngine>,
        compositor: MaskCompositor,
    ) -> Self {
        Self {
            encoder,
            engine,
            compositor,
        }
    }

    /// Eagerly loads the model so a bad asset fails at startup instead of on
    /// the first sampled frame.
    pub fn warm_up(&mut self) -> Result<(), InferenceError> {
        self.engine.load()
    }
}

impl FrameAnalyzer for SegmentationAnalyzer {
    fn analyze(&mut self, frame: &RawFrame) -> Result<CompositeImage, Box<dyn std::error::Error>> {
        let tensor = self.encoder.encode(frame)?;
        let outputs = self.engine.evaluate(&tensor)?;
        let mask = outputs
            .get(PRIMARY_OUTPUT_NAME)
            .ok_or_else(|| InferenceError::MissingOutput(PRIMARY_OUTPUT_NAME.to_string()))?;
        Ok(self.compositor.composite(frame, mask)?)
    }

    fn input_size(&self) -> (u32, u32) {
        (self.encoder.width(), self.encoder.height())
    }

    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Rgba8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::domain::inference_engine::{NamedOutputs, OutputMask};
    use crate::segmentation::domain::tensor_encoder::InputTensor;
    use std::collections::HashMap;

    // --- Stubs ---

    struct StubEngine {
        masks: HashMap<String, Vec<f32>>,
        size: (u32, u32),
    }

    impl StubEngine {
        fn with_primary(mask: Vec<f32>, width: u32, height: u32) -> Self {
            let mut masks = HashMap::new();
            masks.insert(PRIMARY_OUTPUT_NAME.to_string(), mask);
            Self {
                masks,
                size: (width, height),
            }
        }

        /// All seven multi-scale outputs, with only `o0` marking the diagonal.
        fn with_all_outputs(primary: Vec<f32>, width: u32, height: u32) -> Self {
            let pixels = (width * height) as usize;
            let mut masks = HashMap::new();
            for name in crate::shared::constants::SEGMENTATION_OUTPUT_NAMES {
                masks.insert(name.to_string(), vec![0.0; pixels]);
            }
            masks.insert(PRIMARY_OUTPUT_NAME.to_string(), primary);
            Self {
                masks,
                size: (width, height),
            }
        }
    }

    impl InferenceEngine for StubEngine {
        fn load(&mut self) -> Result<(), InferenceError> {
            Ok(())
        }

        fn evaluate(&mut self, _input: &InputTensor) -> Result<NamedOutputs, InferenceError> {
            Ok(self
                .masks
                .iter()
                .map(|(name, data)| {
                    (
                        name.clone(),
                        OutputMask::new(data.clone(), self.size.0, self.size.1),
                    )
                })
                .collect())
        }
    }

    fn red_frame(w: u32, h: u32) -> RawFrame {
        let data: Vec<u8> = [255, 0, 0, 255]
            .iter()
            .copied()
            .cycle()
            .take((w * h * 4) as usize)
            .collect();
        RawFrame::new(data, w, h, PixelFormat::Rgba8)
    }

    fn analyzer(engine: StubEngine, w: u32, h: u32) -> SegmentationAnalyzer {
        SegmentationAnalyzer::new(
            TensorEncoder::new(w, h),
            Box::new(engine),
            MaskCompositor::default(),
        )
    }

    // --- Tests ---

    #[test]
    fn test_end_to_end_red_frame_with_alternating_mask() {
        // 2x2 all-red frame, mask [1, 0, 1, 0]: pixels 0 and 2 fully colored,
        // pixels 1 and 3 transparent black.
        let engine = StubEngine::with_primary(vec![1.0, 0.0, 1.0, 0.0], 2, 2);
        let mut analyzer = analyzer(engine, 2, 2);

        let image = analyzer.analyze(&red_frame(2, 2)).unwrap();

        let red_bgra = [0u8, 0, 255, 255];
        let clear = [0u8, 0, 0, 0];
        assert_eq!(&image.data()[0..4], &red_bgra);
        assert_eq!(&image.data()[4..8], &clear);
        assert_eq!(&image.data()[8..12], &red_bgra);
        assert_eq!(&image.data()[12..16], &clear);
    }

    #[test]
    fn test_only_primary_output_is_composited() {
        // Auxiliary outputs o1..o6 are all zero; only o0 drives the blend.
        let engine = StubEngine::with_all_outputs(vec![1.0, 1.0, 1.0, 1.0], 2, 2);
        let mut analyzer = analyzer(engine, 2, 2);

        let image = analyzer.analyze(&red_frame(2, 2)).unwrap();
        for px in image.data().chunks_exact(4) {
            assert_eq!(px, &[0, 0, 255, 255]);
        }
    }

    #[test]
    fn test_missing_primary_output_is_an_error() {
        let engine = StubEngine {
            masks: HashMap::from([("o6".to_string(), vec![1.0; 4])]),
            size: (2, 2),
        };
        let mut analyzer = analyzer(engine, 2, 2);

        let err = analyzer.analyze(&red_frame(2, 2)).unwrap_err();
        assert!(err.to_string().contains("o0"));
    }

    #[test]
    fn test_wrong_frame_size_skips_evaluation() {
        let engine = StubEngine::with_primary(vec![1.0; 4], 2, 2);
        let mut analyzer = analyzer(engine, 2, 2);

        assert!(analyzer.analyze(&red_frame(3, 3)).is_err());
    }

    #[test]
    fn test_input_size_and_format_come_from_encoder() {
        let engine = StubEngine::with_primary(vec![1.0; 4], 2, 2);
        let analyzer = analyzer(engine, 2, 2);
        assert_eq!(analyzer.input_size(), (2, 2));
        assert_eq!(analyzer.pixel_format(), PixelFormat::Rgba8);
    }

    #[test]
    fn test_warm_up_loads_engine() {
        let engine = StubEngine::with_primary(vec![1.0; 4], 2, 2);
        let mut analyzer = analyzer(engine, 2, 2);
        analyzer.warm_up().unwrap();
    }
}

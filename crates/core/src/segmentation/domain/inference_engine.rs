use std::collections::HashMap;

use thiserror::Error;

use crate::segmentation::domain::tensor_encoder::InputTensor;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("failed to load model: {0}")]
    ModelLoad(String),
    #[error("model evaluation failed: {0}")]
    Evaluation(String),
    #[error("evaluate called while a previous evaluation is still in flight")]
    ConcurrentEvaluation,
    #[error("model did not produce expected output '{0}'")]
    MissingOutput(String),
}

/// A per-pixel confidence map, logical shape `[1, 1, H, W]`.
///
/// Values are nominally in [0, 1] but the model does not clamp them; the
/// compositor does.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputMask {
    data: Vec<f32>,
    width: u32,
    height: u32,
}

impl OutputMask {
    pub fn new(data: Vec<f32>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "mask length must equal width * height"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len()
    }
}

/// Model output name → mask tensor.
pub type NamedOutputs = HashMap<String, OutputMask>;

/// Domain interface for the model session: one reusable loaded model
/// evaluated one input at a time.
///
/// Sessions are not assumed reentrant. The scheduler's single-flight
/// discipline guarantees at most one `evaluate` call in flight;
/// implementations still reject a concurrent call with
/// [`InferenceError::ConcurrentEvaluation`].
pub trait InferenceEngine: Send {
    /// Parses and loads the model, building the reusable session. Idempotent;
    /// called lazily by the first `evaluate` if it hasn't run yet.
    fn load(&mut self) -> Result<(), InferenceError>;

    /// Binds the tensor to the model's declared input and runs it, returning
    /// every named output.
    fn evaluate(&mut self, input: &InputTensor) -> Result<NamedOutputs, InferenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_accessors() {
        let mask = OutputMask::new(vec![0.0, 0.5, 1.0, 0.25], 2, 2);
        assert_eq!(mask.width(), 2);
        assert_eq!(mask.height(), 2);
        assert_eq!(mask.pixel_count(), 4);
        assert_eq!(mask.data()[1], 0.5);
    }

    #[test]
    #[should_panic(expected = "mask length must equal width * height")]
    fn test_mask_wrong_length_panics_in_debug() {
        OutputMask::new(vec![0.0; 3], 2, 2);
    }
}

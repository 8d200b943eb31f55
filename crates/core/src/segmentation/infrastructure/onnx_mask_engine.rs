/// Segmentation model session backed by ONNX Runtime via `ort`.
///
/// The session is built lazily on first use and cached for the engine's
/// lifetime. Input and output names come from the model's own metadata, so
/// the engine works with any single-input model emitting `[1,1,H,W]` float
/// masks.
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::ArrayViewD;

use crate::segmentation::domain::inference_engine::{
    InferenceEngine, InferenceError, NamedOutputs, OutputMask,
};
use crate::segmentation::domain::tensor_encoder::InputTensor;

/// Where the serialized model comes from. The bytes are opaque to the
/// pipeline; only the runtime interprets them.
pub enum ModelData {
    File(PathBuf),
    Memory(Vec<u8>),
}

struct LoadedModel {
    session: ort::session::Session,
    input_name: String,
    output_names: Vec<String>,
}

pub struct OnnxMaskEngine {
    model: ModelData,
    loaded: Option<LoadedModel>,
    in_flight: AtomicBool,
}

impl OnnxMaskEngine {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self::new(ModelData::File(path.into()))
    }

    pub fn from_memory(bytes: Vec<u8>) -> Self {
        Self::new(ModelData::Memory(bytes))
    }

    pub fn new(model: ModelData) -> Self {
        Self {
            model,
            loaded: None,
            in_flight: AtomicBool::new(false),
        }
    }

    fn ensure_loaded(&mut self) -> Result<&mut LoadedModel, InferenceError> {
        if self.loaded.is_none() {
            let mut builder = ort::session::Session::builder()
                .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;
            let session = match &self.model {
                ModelData::File(path) => builder.commit_from_file(path),
                ModelData::Memory(bytes) => builder.commit_from_memory(bytes),
            }
            .map_err(|e| InferenceError::ModelLoad(e.to_string()))?;

            let input_name = session
                .inputs()
                .first()
                .map(|input| input.name().to_string())
                .ok_or_else(|| {
                    InferenceError::ModelLoad("model declares no inputs".to_string())
                })?;
            let output_names: Vec<String> = session
                .outputs()
                .iter()
                .map(|output| output.name().to_string())
                .collect();
            if output_names.is_empty() {
                return Err(InferenceError::ModelLoad(
                    "model declares no outputs".to_string(),
                ));
            }

            log::info!(
                "Segmentation model loaded: input '{input_name}', {} outputs",
                output_names.len()
            );

            self.loaded = Some(LoadedModel {
                session,
                input_name,
                output_names,
            });
        }
        Ok(self.loaded.as_mut().unwrap())
    }
}

impl InferenceEngine for OnnxMaskEngine {
    fn load(&mut self) -> Result<(), InferenceError> {
        self.ensure_loaded().map(|_| ())
    }

    fn evaluate(&mut self, input: &InputTensor) -> Result<NamedOutputs, InferenceError> {
        // The scheduler never overlaps evaluations; this guard turns a broken
        // caller into a diagnosable error instead of a reentrant session.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(InferenceError::ConcurrentEvaluation);
        }
        let result = self.evaluate_locked(input);
        self.in_flight.store(false, Ordering::Release);
        result
    }
}

impl OnnxMaskEngine {
    fn evaluate_locked(&mut self, input: &InputTensor) -> Result<NamedOutputs, InferenceError> {
        let loaded = self.ensure_loaded()?;

        let tensor = ort::value::TensorRef::from_array_view(input.view())
            .map_err(|e| InferenceError::Evaluation(e.to_string()))?;
        let outputs = loaded
            .session
            .run(ort::inputs![loaded.input_name.as_str() => tensor])
            .map_err(|e| InferenceError::Evaluation(e.to_string()))?;

        let mut named = NamedOutputs::new();
        for name in &loaded.output_names {
            let array = outputs[name.as_str()]
                .try_extract_array::<f32>()
                .map_err(|e| InferenceError::Evaluation(e.to_string()))?;
            named.insert(name.clone(), mask_from_array(name, array)?);
        }
        Ok(named)
    }
}

/// Converts one `[1, 1, H, W]` output array into an [`OutputMask`].
fn mask_from_array(name: &str, array: ArrayViewD<'_, f32>) -> Result<OutputMask, InferenceError> {
    let shape = array.shape();
    if shape.len() != 4 || shape[0] != 1 || shape[1] != 1 {
        return Err(InferenceError::Evaluation(format!(
            "output '{name}' has shape {shape:?}, expected [1, 1, H, W]"
        )));
    }
    let height = shape[2] as u32;
    let width = shape[3] as u32;
    let data: Vec<f32> = array.iter().copied().collect();
    Ok(OutputMask::new(data, width, height))
}

pub mod inference_engine;
pub mod mask_compositor;
pub mod segmentation_analyzer;
pub mod tensor_encoder;

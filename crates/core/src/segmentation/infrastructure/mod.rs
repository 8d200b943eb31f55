pub mod onnx_mask_engine;

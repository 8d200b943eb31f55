pub const U2NET_MODEL_NAME: &str = "u2net.onnx";
pub const U2NET_MODEL_URL: &str =
    "https://github.com/danielgatis/rembg/releases/download/v0.0.0/u2net.onnx";

/// Square input resolution of the segmentation model.
pub const MODEL_INPUT_SIZE: u32 = 320;

/// Output names produced by the segmentation model, finest mask first.
pub const SEGMENTATION_OUTPUT_NAMES: [&str; 7] = ["o0", "o1", "o2", "o3", "o4", "o5", "o6"];

/// The finest-resolution mask; the only output the compositor consumes.
pub const PRIMARY_OUTPUT_NAME: &str = "o0";

/// Default sampling cadence (~15 Hz).
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 66;

/// Default mask cutoff: every pixel with positive confidence is drawn.
pub const DEFAULT_MASK_CUTOFF: f32 = 0.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub mod analyze_image_use_case;
pub mod frame_analyzer;
pub mod frame_scheduler;
pub mod pipeline_logger;

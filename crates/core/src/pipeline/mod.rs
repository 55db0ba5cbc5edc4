pub mod frame_pipeline;
pub mod frame_slot;
pub mod infrastructure;
pub mod pipeline_config;
pub mod pipeline_logger;

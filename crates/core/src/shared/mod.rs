pub mod constants;
pub mod frame;
pub mod geometry;
pub mod settings;
pub mod video_metadata;

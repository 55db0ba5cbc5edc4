pub mod detection;
pub mod expression;
pub mod overlay;
pub mod pipeline;
pub mod shared;
pub mod video;

use crate::shared::frame::Frame;

/// Presents rendered frames.
pub trait DisplaySurface: Send {
    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}

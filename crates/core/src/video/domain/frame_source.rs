use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CaptureError {
    /// The source could not be opened; capture cannot start.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("frame source failed: {0}")]
    Source(String),
}

/// Produces camera frames.
///
/// A source is opened once per capture run and then drained through
/// `frames()` on the producer thread. Frame indices increase by one per
/// delivered frame, starting at 0 after every `open`.
pub trait FrameSource: Send {
    /// Acquires the device and returns its metadata.
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Frames in capture order. Blocks between frames for paced sources.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases the device. Safe to call more than once.
    fn close(&mut self);
}

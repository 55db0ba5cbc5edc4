use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::frame::Frame;

/// Domain interface for the face detector.
///
/// An empty result means "no face in this frame", not a failure.
/// Implementations may be stateful (e.g., tracking across frames),
/// hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame)
        -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>>;
}

use std::borrow::Cow;

use crate::detection::domain::face_observation::FaceObservation;
use crate::overlay::domain::overlay_descriptor::OverlayDescriptor;
use crate::shared::frame::Frame;

/// Composited output handed to the display surface.
///
/// Borrowed when the source frame passes through untouched.
pub type RenderFrame<'a> = Cow<'a, Frame>;

/// Domain interface for drawing the overlay onto the primary face.
///
/// Implementations never mutate the source frame, and the output always
/// has the source frame's dimensions. With no overlay or no observations
/// the source frame is returned as-is.
pub trait FrameCompositor: Send {
    fn composite<'a>(
        &self,
        frame: &'a Frame,
        observations: &[FaceObservation],
        overlay: Option<&OverlayDescriptor>,
    ) -> Result<RenderFrame<'a>, Box<dyn std::error::Error>>;
}

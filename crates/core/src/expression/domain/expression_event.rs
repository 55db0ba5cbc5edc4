/// A named expression transition, published once per sampled frame.
///
/// Several events may be produced for one frame; their relative order
/// carries no meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpressionEvent {
    FaceDetected,
    FaceLost,
    Smiling,
    NotSmiling,
    Blinking,
    NotBlinking,
    Winking,
    NotWinking,
    LeftEyeClosed,
    LeftEyeOpen,
    RightEyeClosed,
    RightEyeOpen,
}

impl ExpressionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ExpressionEvent::FaceDetected => "faceDetected",
            ExpressionEvent::FaceLost => "faceLost",
            ExpressionEvent::Smiling => "smiling",
            ExpressionEvent::NotSmiling => "notSmiling",
            ExpressionEvent::Blinking => "blinking",
            ExpressionEvent::NotBlinking => "notBlinking",
            ExpressionEvent::Winking => "winking",
            ExpressionEvent::NotWinking => "notWinking",
            ExpressionEvent::LeftEyeClosed => "leftEyeClosed",
            ExpressionEvent::LeftEyeOpen => "leftEyeOpen",
            ExpressionEvent::RightEyeClosed => "rightEyeClosed",
            ExpressionEvent::RightEyeOpen => "rightEyeOpen",
        }
    }

    /// `on` when the tracked flag is true, `off` otherwise.
    pub(crate) fn for_flag(value: bool, on: Self, off: Self) -> Self {
        if value {
            on
        } else {
            off
        }
    }
}

impl std::fmt::Display for ExpressionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

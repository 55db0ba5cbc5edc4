use serde::{Deserialize, Serialize};

use crate::shared::geometry::{Point, Rect};

/// One detector-reported face in a single frame.
///
/// Built fresh by the detector for every frame and never mutated afterwards.
/// Optional fields are `None` when the detector could not estimate them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceObservation {
    pub bounding_box: Rect,
    /// Roll in degrees, detector convention.
    pub angle: Option<f64>,
    pub left_eye_position: Option<Point>,
    pub right_eye_position: Option<Point>,
    pub mouth_position: Option<Point>,
    pub has_smile: bool,
    pub left_eye_closed: bool,
    pub right_eye_closed: bool,
}

impl FaceObservation {
    pub fn new(bounding_box: Rect) -> Self {
        Self {
            bounding_box,
            ..Self::default()
        }
    }

    pub fn with_angle(mut self, degrees: f64) -> Self {
        self.angle = Some(degrees);
        self
    }

    pub fn with_smile(mut self, has_smile: bool) -> Self {
        self.has_smile = has_smile;
        self
    }

    pub fn with_eyes_closed(mut self, left: bool, right: bool) -> Self {
        self.left_eye_closed = left;
        self.right_eye_closed = right;
        self
    }

    pub fn with_landmarks(mut self, left_eye: Point, right_eye: Point, mouth: Point) -> Self {
        self.left_eye_position = Some(left_eye);
        self.right_eye_position = Some(right_eye);
        self.mouth_position = Some(mouth);
        self
    }
}

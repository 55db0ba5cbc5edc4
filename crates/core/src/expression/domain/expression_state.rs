use serde::{Deserialize, Serialize};

use crate::expression::domain::expression_event::ExpressionEvent;
use crate::expression::domain::expression_label::ExpressionLabel;
use crate::shared::geometry::{Point, Rect};

/// When the classifier emits events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Every sampled frame re-emits the event for each tracked flag.
    #[default]
    Always,
    /// Only flags that flipped since the previous sampled frame emit.
    OnChange,
}

impl std::fmt::Display for NotifyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyPolicy::Always => write!(f, "always"),
            NotifyPolicy::OnChange => write!(f, "on-change"),
        }
    }
}

impl std::str::FromStr for NotifyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(NotifyPolicy::Always),
            "on-change" | "on_change" => Ok(NotifyPolicy::OnChange),
            other => Err(format!(
                "Notify policy must be 'always' or 'on-change', got '{other}'"
            )),
        }
    }
}

/// Snapshot of everything the classifier knows about the tracked face.
///
/// `is_blinking` implies both eyes closed and `is_winking` implies at least
/// one; with both eyes open both are false.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionState {
    pub face_detected: bool,
    pub has_smile: bool,
    pub is_blinking: bool,
    pub is_winking: bool,
    pub left_eye_closed: bool,
    pub right_eye_closed: bool,
    /// Last known roll in degrees.
    pub face_angle: Option<f64>,
    /// Change in roll since the previous angle; `None` when this frame had no angle.
    pub face_angle_delta: Option<f64>,
    pub face_bounds: Option<Rect>,
    pub left_eye_position: Option<Point>,
    pub right_eye_position: Option<Point>,
    pub mouth_position: Option<Point>,
}

/// Result of one classification: the new snapshot, the transitions it
/// produced, and the label (absent when no face was seen).
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionUpdate {
    pub state: ExpressionState,
    pub events: Vec<ExpressionEvent>,
    pub label: Option<ExpressionLabel>,
}

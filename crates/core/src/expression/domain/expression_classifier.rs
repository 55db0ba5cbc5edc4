use crate::detection::domain::face_observation::FaceObservation;
use crate::expression::domain::expression_event::ExpressionEvent;
use crate::expression::domain::expression_label::ExpressionLabel;
use crate::expression::domain::expression_state::{ExpressionState, ExpressionUpdate, NotifyPolicy};

/// Turns per-frame detector flags into a stable expression state.
///
/// Only the first observation is considered; callers that care which face
/// that is should order observations beforehand (see `PrimaryFaceSelector`).
/// Classification never fails: a missing optional field just leaves the
/// corresponding state untouched.
pub struct ExpressionClassifier {
    policy: NotifyPolicy,
    state: ExpressionState,
}

impl ExpressionClassifier {
    pub fn new(policy: NotifyPolicy) -> Self {
        Self {
            policy,
            state: ExpressionState::default(),
        }
    }

    pub fn state(&self) -> &ExpressionState {
        &self.state
    }

    pub fn classify(&mut self, observations: &[FaceObservation]) -> ExpressionUpdate {
        let previous = self.state.clone();
        let mut events = Vec::new();

        let Some(face) = observations.first() else {
            self.state.face_detected = false;
            self.track(
                &mut events,
                previous.face_detected,
                false,
                ExpressionEvent::FaceDetected,
                ExpressionEvent::FaceLost,
            );
            return self.finish(events, None);
        };

        self.apply(face, previous.face_angle);

        let current = self.state.clone();
        let flags = [
            (
                previous.face_detected,
                current.face_detected,
                ExpressionEvent::FaceDetected,
                ExpressionEvent::FaceLost,
            ),
            (
                previous.has_smile,
                current.has_smile,
                ExpressionEvent::Smiling,
                ExpressionEvent::NotSmiling,
            ),
            (
                previous.is_blinking,
                current.is_blinking,
                ExpressionEvent::Blinking,
                ExpressionEvent::NotBlinking,
            ),
            (
                previous.is_winking,
                current.is_winking,
                ExpressionEvent::Winking,
                ExpressionEvent::NotWinking,
            ),
            (
                previous.left_eye_closed,
                current.left_eye_closed,
                ExpressionEvent::LeftEyeClosed,
                ExpressionEvent::LeftEyeOpen,
            ),
            (
                previous.right_eye_closed,
                current.right_eye_closed,
                ExpressionEvent::RightEyeClosed,
                ExpressionEvent::RightEyeOpen,
            ),
        ];
        for (before, after, on, off) in flags {
            self.track(&mut events, before, after, on, off);
        }

        let label = ExpressionLabel::from_state(&current);
        self.finish(events, Some(label))
    }

    fn apply(&mut self, face: &FaceObservation, previous_angle: Option<f64>) {
        let s = &mut self.state;
        s.face_detected = true;
        s.face_bounds = Some(face.bounding_box);

        match face.angle {
            Some(angle) => {
                s.face_angle_delta = Some(angle - previous_angle.unwrap_or(0.0));
                s.face_angle = Some(angle);
            }
            None => s.face_angle_delta = None,
        }

        if face.left_eye_position.is_some() {
            s.left_eye_position = face.left_eye_position;
        }
        if face.right_eye_position.is_some() {
            s.right_eye_position = face.right_eye_position;
        }
        if face.mouth_position.is_some() {
            s.mouth_position = face.mouth_position;
        }

        s.has_smile = face.has_smile;
        s.left_eye_closed = face.left_eye_closed;
        s.right_eye_closed = face.right_eye_closed;
        s.is_winking = face.left_eye_closed || face.right_eye_closed;
        s.is_blinking = face.left_eye_closed && face.right_eye_closed;
    }

    fn track(
        &self,
        events: &mut Vec<ExpressionEvent>,
        before: bool,
        after: bool,
        on: ExpressionEvent,
        off: ExpressionEvent,
    ) {
        let emit = match self.policy {
            NotifyPolicy::Always => true,
            NotifyPolicy::OnChange => before != after,
        };
        if emit {
            events.push(ExpressionEvent::for_flag(after, on, off));
        }
    }

    fn finish(
        &self,
        events: Vec<ExpressionEvent>,
        label: Option<ExpressionLabel>,
    ) -> ExpressionUpdate {
        if !events.is_empty() {
            log::debug!(
                "Expression events: {}",
                events
                    .iter()
                    .map(ExpressionEvent::name)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        ExpressionUpdate {
            state: self.state.clone(),
            events,
            label,
        }
    }
}

impl Default for ExpressionClassifier {
    fn default() -> Self {
        Self::new(NotifyPolicy::default())
    }
}

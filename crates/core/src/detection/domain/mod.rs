pub mod face_detector;
pub mod face_observation;
pub mod primary_face_selector;

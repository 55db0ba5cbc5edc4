use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::frame::Frame;

#[derive(Debug, Error)]
pub enum ObservationTrackError {
    #[error("failed to read observation track {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid observation track {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct ObservationTrack {
    frames: HashMap<usize, Vec<FaceObservation>>,
}

/// Replays recorded detector output by frame index.
///
/// Stands in for a live detector: the observations were produced offline
/// and stored as `{"frames": {"<index>": [observation, ...]}}`.
pub struct RecordedFaceDetector {
    track: Arc<HashMap<usize, Vec<FaceObservation>>>,
}

impl RecordedFaceDetector {
    pub fn new(track: Arc<HashMap<usize, Vec<FaceObservation>>>) -> Self {
        Self { track }
    }

    pub fn from_file(path: &Path) -> Result<Self, ObservationTrackError> {
        let json = std::fs::read_to_string(path).map_err(|source| ObservationTrackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let track: ObservationTrack =
            serde_json::from_str(&json).map_err(|source| ObservationTrackError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "Loaded observations for {} frames from {}",
            track.frames.len(),
            path.display()
        );
        Ok(Self::new(Arc::new(track.frames)))
    }

    pub fn frame_count(&self) -> usize {
        self.track.len()
    }
}

impl FaceDetector for RecordedFaceDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceObservation>, Box<dyn std::error::Error>> {
        Ok(self.track.get(&frame.index()).cloned().unwrap_or_default())
    }
}

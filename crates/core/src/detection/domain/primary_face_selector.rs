use serde::{Deserialize, Serialize};

use crate::detection::domain::face_observation::FaceObservation;
use crate::shared::geometry::Point;

/// Which observation counts as "the" face when several are detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceSelection {
    /// Detector order decides: index 0 wins.
    #[default]
    First,
    /// The face whose box centre is closest to the previous primary face.
    Nearest,
}

impl std::fmt::Display for FaceSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaceSelection::First => write!(f, "first"),
            FaceSelection::Nearest => write!(f, "nearest"),
        }
    }
}

impl std::str::FromStr for FaceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(FaceSelection::First),
            "nearest" => Ok(FaceSelection::Nearest),
            other => Err(format!(
                "Face selection must be 'first' or 'nearest', got '{other}'"
            )),
        }
    }
}

/// Moves the primary face to index 0 so every downstream stage that reads
/// "the first observation" agrees on the same face.
pub struct PrimaryFaceSelector {
    policy: FaceSelection,
    previous_center: Option<Point>,
}

impl PrimaryFaceSelector {
    pub fn new(policy: FaceSelection) -> Self {
        Self {
            policy,
            previous_center: None,
        }
    }

    pub fn select(&mut self, mut observations: Vec<FaceObservation>) -> Vec<FaceObservation> {
        if observations.is_empty() {
            return observations;
        }

        if let (FaceSelection::Nearest, Some(prev)) = (self.policy, self.previous_center) {
            let nearest = observations
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    let da = a.bounding_box.center().distance_to(&prev);
                    let db = b.bounding_box.center().distance_to(&prev);
                    da.total_cmp(&db)
                })
                .map(|(i, _)| i)
                .unwrap_or(0);
            if nearest != 0 {
                let primary = observations.remove(nearest);
                observations.insert(0, primary);
            }
        }

        self.previous_center = Some(observations[0].bounding_box.center());
        observations
    }
}

impl Default for PrimaryFaceSelector {
    fn default() -> Self {
        Self::new(FaceSelection::First)
    }
}

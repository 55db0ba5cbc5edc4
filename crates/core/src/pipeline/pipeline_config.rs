use std::time::Duration;

use thiserror::Error;

use crate::detection::domain::primary_face_selector::FaceSelection;
use crate::expression::domain::expression_state::NotifyPolicy;
use crate::shared::settings::Settings;
use crate::shared::video_metadata::frame_interval;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("throttle interval must be at least 1 frame")]
    ZeroThrottle,
    #[error("render rate must be a positive number of frames per second, got {0}")]
    InvalidRenderFps(f64),
}

/// Validated runtime settings for a [`FramePipeline`](super::frame_pipeline::FramePipeline)
/// and its capture loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Classify on the first of every `throttle_interval` frames.
    pub throttle_interval: usize,
    pub notify_policy: NotifyPolicy,
    pub face_selection: FaceSelection,
    pub render_fps: f64,
    pub progress_every: usize,
}

impl PipelineConfig {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.throttle_interval == 0 {
            return Err(ConfigError::ZeroThrottle);
        }
        if frame_interval(self.render_fps).is_none() {
            return Err(ConfigError::InvalidRenderFps(self.render_fps));
        }
        Ok(self)
    }

    /// Time between render ticks. Zero only for a config that skipped
    /// [`validate`](Self::validate).
    pub fn render_interval(&self) -> Duration {
        frame_interval(self.render_fps).unwrap_or_default()
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Self::from_settings_unchecked(settings).validate()
    }

    fn from_settings_unchecked(settings: &Settings) -> Self {
        Self {
            throttle_interval: settings.throttle_interval,
            notify_policy: settings.notify_policy,
            face_selection: settings.face_selection,
            render_fps: settings.render_fps,
            progress_every: settings.progress_every.max(1),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_settings_unchecked(&Settings::default())
    }
}

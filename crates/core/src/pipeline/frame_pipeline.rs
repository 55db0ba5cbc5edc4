use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_observation::FaceObservation;
use crate::detection::domain::primary_face_selector::PrimaryFaceSelector;
use crate::expression::domain::expression_classifier::ExpressionClassifier;
use crate::expression::domain::expression_event::ExpressionEvent;
use crate::expression::domain::expression_label::ExpressionLabel;
use crate::expression::domain::expression_state::{ExpressionState, ExpressionUpdate};
use crate::overlay::domain::frame_compositor::{FrameCompositor, RenderFrame};
use crate::overlay::domain::overlay_catalog::OverlayCatalog;
use crate::pipeline::frame_slot::OverlaySlot;
use crate::pipeline::pipeline_config::PipelineConfig;
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::frame::Frame;
use crate::video::domain::display_surface::DisplaySurface;

/// Undrained events beyond this are discarded oldest-first.
const EVENT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("face detection failed: {0}")]
    Detection(String),
    #[error("compositing failed: {0}")]
    Compositing(String),
    #[error("display surface failed: {0}")]
    Render(String),
}

/// Per-frame sub-states of a capturing session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStage {
    Detecting,
    Classifying,
    Compositing,
    Rendering,
}

impl FrameStage {
    /// Key the stage's duration is reported under.
    pub fn timing_key(&self) -> &'static str {
        match self {
            FrameStage::Detecting => "detect",
            FrameStage::Classifying => "classify",
            FrameStage::Compositing => "composite",
            FrameStage::Rendering => "render",
        }
    }
}

impl std::fmt::Display for FrameStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.timing_key())
    }
}

/// Everything one pass produced for a frame, before it is presented.
pub struct ProcessedFrame<'a> {
    pub render: RenderFrame<'a>,
    /// This frame's observations, primary face first.
    pub observations: Vec<FaceObservation>,
    /// Present only on frames where classification ran.
    pub update: Option<ExpressionUpdate>,
}

impl ProcessedFrame<'_> {
    pub fn classified(&self) -> bool {
        self.update.is_some()
    }

    pub fn label(&self) -> Option<ExpressionLabel> {
        self.update.as_ref().and_then(|u| u.label)
    }
}

/// Drives detect → [classify] → composite → render for one frame at a time.
///
/// Detection and compositing run on every frame. Classification, and with it
/// the overlay choice, runs only on the first of every `throttle_interval`
/// frames; in between, the last chosen overlay is drawn against the current
/// frame's observations. The overlay lives in a shared [`OverlaySlot`], so
/// other threads can also replace it.
pub struct FramePipeline {
    detector: Box<dyn FaceDetector>,
    compositor: Box<dyn FrameCompositor>,
    classifier: ExpressionClassifier,
    selector: PrimaryFaceSelector,
    catalog: OverlayCatalog,
    overlay: OverlaySlot,
    logger: Box<dyn PipelineLogger>,
    throttle_interval: usize,
    frame_count: usize,
    events_tx: Sender<ExpressionEvent>,
    events_rx: Receiver<ExpressionEvent>,
}

impl FramePipeline {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        compositor: Box<dyn FrameCompositor>,
        catalog: OverlayCatalog,
        config: &PipelineConfig,
    ) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::bounded(EVENT_QUEUE_CAPACITY);
        Self {
            detector,
            compositor,
            classifier: ExpressionClassifier::new(config.notify_policy),
            selector: PrimaryFaceSelector::new(config.face_selection),
            catalog,
            overlay: OverlaySlot::default(),
            logger: Box::new(NullPipelineLogger),
            throttle_interval: config.throttle_interval.max(1),
            frame_count: 0,
            events_tx,
            events_rx,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Shares `slot` as the current overlay, e.g. one pre-loaded with an
    /// initial overlay or also held by a UI thread.
    pub fn with_overlay_slot(mut self, slot: OverlaySlot) -> Self {
        self.overlay = slot;
        self
    }

    pub fn overlay_slot(&self) -> OverlaySlot {
        self.overlay.clone()
    }

    /// Receiver for every event the classifier emits. Clones of the
    /// receiver compete for events rather than each seeing all of them.
    pub fn events(&self) -> Receiver<ExpressionEvent> {
        self.events_rx.clone()
    }

    pub fn expression_state(&self) -> &ExpressionState {
        self.classifier.state()
    }

    /// Frames processed so far.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    /// Detecting → [Classifying] → Compositing for `frame`.
    pub fn process_frame<'a>(
        &mut self,
        frame: &'a Frame,
    ) -> Result<ProcessedFrame<'a>, PipelineError> {
        let started = Instant::now();
        let detected = self
            .detector
            .detect(frame)
            .map_err(|e| PipelineError::Detection(e.to_string()))?;
        let observations = self.selector.select(detected);
        self.logger.timing(FrameStage::Detecting.timing_key(), elapsed_ms(started));
        self.logger.metric("faces", observations.len() as f64);

        let update = if self.frame_count % self.throttle_interval == 0 {
            Some(self.classify(&observations))
        } else {
            None
        };
        self.frame_count += 1;

        let started = Instant::now();
        let overlay = self.overlay.snapshot();
        let render = self
            .compositor
            .composite(frame, &observations, overlay.as_ref())
            .map_err(|e| PipelineError::Compositing(e.to_string()))?;
        self.logger.timing(FrameStage::Compositing.timing_key(), elapsed_ms(started));

        Ok(ProcessedFrame {
            render,
            observations,
            update,
        })
    }

    /// Rendering: hands the composited frame to `surface`.
    pub fn present(
        &mut self,
        processed: &ProcessedFrame<'_>,
        surface: &mut dyn DisplaySurface,
    ) -> Result<(), PipelineError> {
        let started = Instant::now();
        surface
            .present(&processed.render)
            .map_err(|e| PipelineError::Render(e.to_string()))?;
        self.logger.timing(FrameStage::Rendering.timing_key(), elapsed_ms(started));
        Ok(())
    }

    pub fn run_cycle<'a>(
        &mut self,
        frame: &'a Frame,
        surface: &mut dyn DisplaySurface,
    ) -> Result<ProcessedFrame<'a>, PipelineError> {
        let processed = self.process_frame(frame)?;
        self.present(&processed, surface)?;
        Ok(processed)
    }

    pub fn summary(&self) {
        self.logger.summary();
    }

    fn classify(&mut self, observations: &[FaceObservation]) -> ExpressionUpdate {
        let started = Instant::now();
        let update = self.classifier.classify(observations);
        if let Some(label) = update.label {
            self.overlay.set(self.catalog.lookup(label).clone());
        }
        for &event in &update.events {
            self.publish(event);
        }
        self.logger.timing(FrameStage::Classifying.timing_key(), elapsed_ms(started));
        update
    }

    fn publish(&self, event: ExpressionEvent) {
        if let Err(TrySendError::Full(event)) = self.events_tx.try_send(event) {
            log::trace!("Event queue full, dropping oldest event");
            let _ = self.events_rx.try_recv();
            let _ = self.events_tx.try_send(event);
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use crate::pipeline::frame_pipeline::{FramePipeline, PipelineError};
use crate::pipeline::frame_slot::LatestFrameSlot;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::display_surface::DisplaySurface;
use crate::video::domain::frame_source::{CaptureError, FrameSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    Stopped,
}

/// Runs a frame source on a producer thread and renders on demand.
///
/// Layout: `source thread → LatestFrameSlot → render_latest (caller's thread)`
///
/// The producer overwrites the slot with every captured frame; the render
/// side takes only the newest one, so a slow renderer skips frames instead
/// of queueing them. `stop` joins the producer before returning, so no frame
/// is delivered afterwards.
pub struct CaptureSession {
    source: Option<Box<dyn FrameSource>>,
    producer: Option<JoinHandle<Box<dyn FrameSource>>>,
    slot: LatestFrameSlot,
    state: SessionState,
    cancelled: Arc<AtomicBool>,
    exhausted: Arc<AtomicBool>,
    source_error: Arc<Mutex<Option<String>>>,
    metadata: Option<VideoMetadata>,
    rendered: usize,
}

impl CaptureSession {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source: Some(source),
            producer: None,
            slot: LatestFrameSlot::new(),
            state: SessionState::Idle,
            cancelled: Arc::new(AtomicBool::new(false)),
            exhausted: Arc::new(AtomicBool::new(false)),
            source_error: Arc::new(Mutex::new(None)),
            metadata: None,
            rendered: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Metadata from the most recent successful `start`.
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    /// Opens the source and starts producing frames.
    ///
    /// A no-op while already capturing. Failing to open the source leaves
    /// the session in its previous state.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state == SessionState::Capturing {
            return Ok(());
        }
        let mut source = self.source.take().ok_or_else(|| {
            CaptureError::DeviceUnavailable("source was lost by a previous run".into())
        })?;

        let metadata = match source.open() {
            Ok(metadata) => metadata,
            Err(e) => {
                self.source = Some(source);
                return Err(CaptureError::DeviceUnavailable(e.to_string()));
            }
        };
        log::info!(
            "Capture started: {}x{} @ {:.1} fps",
            metadata.width,
            metadata.height,
            metadata.fps
        );

        self.cancelled.store(false, Ordering::Relaxed);
        self.exhausted.store(false, Ordering::Relaxed);
        *self
            .source_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.slot.clear();

        self.producer = Some(spawn_producer(
            source,
            self.slot.clone(),
            self.cancelled.clone(),
            self.exhausted.clone(),
            self.source_error.clone(),
        ));
        self.metadata = Some(metadata);
        self.state = SessionState::Capturing;
        Ok(())
    }

    /// Halts capture and waits for the producer to finish. Idempotent; any
    /// frame not yet rendered is discarded.
    pub fn stop(&mut self) {
        if self.state != SessionState::Capturing {
            return;
        }
        self.cancelled.store(true, Ordering::Relaxed);
        if let Some(handle) = self.producer.take() {
            match handle.join() {
                Ok(source) => self.source = Some(source),
                Err(_) => log::error!("Capture thread panicked; source cannot be restarted"),
            }
        }
        self.slot.clear();
        self.state = SessionState::Stopped;
        log::info!(
            "Capture stopped after {} rendered frames ({} dropped)",
            self.rendered,
            self.dropped_frames()
        );
    }

    /// Runs one pipeline cycle on the newest captured frame.
    ///
    /// Returns `Ok(false)` when not capturing or no new frame has arrived
    /// since the last call.
    pub fn render_latest(
        &mut self,
        pipeline: &mut FramePipeline,
        surface: &mut dyn DisplaySurface,
    ) -> Result<bool, PipelineError> {
        if self.state != SessionState::Capturing {
            return Ok(false);
        }
        let Some(frame) = self.slot.take() else {
            return Ok(false);
        };

        pipeline.run_cycle(&frame, surface)?;
        self.rendered += 1;

        let total = self.metadata.as_ref().map_or(0, |m| m.total_frames);
        let logger = pipeline.logger_mut();
        logger.metric("dropped_frames", self.dropped_frames() as f64);
        logger.progress(self.rendered, total);
        Ok(true)
    }

    /// The producer has delivered its last frame (or failed).
    pub fn is_source_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Acquire)
    }

    /// A frame is waiting for `render_latest`.
    pub fn has_pending_frame(&self) -> bool {
        self.slot.has_pending()
    }

    /// Why the producer stopped early, if it did.
    pub fn source_error(&self) -> Option<CaptureError> {
        self.source_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .map(CaptureError::Source)
    }

    /// Frames replaced in the slot before they could be rendered.
    pub fn dropped_frames(&self) -> usize {
        self.slot.dropped_frames()
    }

    pub fn rendered_frames(&self) -> usize {
        self.rendered
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_producer(
    mut source: Box<dyn FrameSource>,
    slot: LatestFrameSlot,
    cancelled: Arc<AtomicBool>,
    exhausted: Arc<AtomicBool>,
    source_error: Arc<Mutex<Option<String>>>,
) -> JoinHandle<Box<dyn FrameSource>> {
    std::thread::spawn(move || {
        for frame_result in source.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            match frame_result {
                Ok(frame) => {
                    slot.publish(frame);
                }
                Err(e) => {
                    log::warn!("Frame source failed: {e}");
                    *source_error.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some(e.to_string());
                    break;
                }
            }
        }
        source.close();
        exhausted.store(true, Ordering::Release);
        source
    })
}

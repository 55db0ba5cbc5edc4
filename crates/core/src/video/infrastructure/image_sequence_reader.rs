use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::{frame_interval, VideoMetadata};
use crate::video::domain::frame_source::FrameSource;

/// Emulates a camera with still images on disk.
///
/// `path` is either a single image or a directory whose images (matched by
/// extension, case-insensitive) are read in file-name order. With a frame
/// interval set, `frames()` sleeps so consecutive frames are at least that
/// far apart, like a camera delivering at a fixed rate.
pub struct ImageSequenceReader {
    path: PathBuf,
    frame_interval: Option<Duration>,
    paths: Option<Vec<PathBuf>>,
}

impl ImageSequenceReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame_interval: None,
            paths: None,
        }
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = Some(interval).filter(|d| !d.is_zero());
        self
    }

    /// Paces delivery at `fps` frames per second. Rates without a usable
    /// period disable pacing.
    pub fn with_fps(self, fps: f64) -> Self {
        match frame_interval(fps) {
            Some(interval) => self.with_frame_interval(interval),
            None => self,
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn collect_images(path: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(format!("No such image or directory: {}", path.display()).into());
    }
    let mut images: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    images.sort();
    if images.is_empty() {
        return Err(format!("No images found in {}", path.display()).into());
    }
    Ok(images)
}

fn decode_rgb(path: &Path, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

impl FrameSource for ImageSequenceReader {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let paths = collect_images(&self.path)?;
        let (width, height) = image::image_dimensions(&paths[0])?;
        let fps = self
            .frame_interval
            .map(|d| 1.0 / d.as_secs_f64())
            .unwrap_or(0.0);

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: paths.len(),
            source_path: Some(self.path.clone()),
        };
        log::debug!(
            "Opened image sequence {} ({} frames, {}x{})",
            self.path.display(),
            paths.len(),
            width,
            height
        );
        self.paths = Some(paths);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(paths) = self.paths.as_ref() else {
            return Box::new(std::iter::once(Err(
                "ImageSequenceReader: not opened".into()
            )));
        };
        let interval = self.frame_interval;
        let mut last_delivery: Option<Instant> = None;

        Box::new(paths.iter().enumerate().map(move |(index, path)| {
            if let (Some(interval), Some(last)) = (interval, last_delivery) {
                let elapsed = last.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
            let frame = decode_rgb(path, index);
            last_delivery = Some(Instant::now());
            frame
        }))
    }

    fn close(&mut self) {
        self.paths = None;
    }
}

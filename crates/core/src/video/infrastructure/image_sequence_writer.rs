use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::display_surface::DisplaySurface;

/// Display surface that writes every presented frame to
/// `<dir>/frame_<index:06>.png`.
pub struct ImageSequenceWriter {
    dir: PathBuf,
    frames_written: usize,
}

impl ImageSequenceWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            frames_written: 0,
        }
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

fn save(path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
    let data = frame.data().to_vec();
    match frame.channels() {
        3 => image::RgbImage::from_raw(frame.width(), frame.height(), data)
            .ok_or("Failed to create image from frame data")?
            .save(path)?,
        4 => image::RgbaImage::from_raw(frame.width(), frame.height(), data)
            .ok_or("Failed to create image from frame data")?
            .save(path)?,
        n => return Err(format!("Cannot write {n}-channel frame").into()),
    }
    Ok(())
}

impl DisplaySurface for ImageSequenceWriter {
    fn present(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.frames_written == 0 {
            std::fs::create_dir_all(&self.dir)?;
        }
        save(&self.frame_path(frame.index()), frame)?;
        self.frames_written += 1;
        Ok(())
    }
}

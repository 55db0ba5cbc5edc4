use std::sync::Arc;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::geometry::Size;

#[derive(Debug, Error, PartialEq)]
pub enum OverlayError {
    #[error("overlay image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("overlay image must be RGB or RGBA, got {0} channels")]
    UnsupportedChannels(u8),
    #[error("overlay natural size must be positive, got {width}x{height}")]
    InvalidNaturalSize { width: f64, height: f64 },
}

/// The replacement image plus the size it is laid out at.
///
/// `natural_size` defaults to the pixel dimensions; a different value (e.g.
/// a 2x asset described in points) changes only how the face box scales it.
/// Cloning is cheap: the pixels are shared.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayDescriptor {
    image: Arc<Frame>,
    natural_size: Size,
}

impl OverlayDescriptor {
    pub fn new(image: Frame) -> Result<Self, OverlayError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(OverlayError::EmptyImage {
                width: image.width(),
                height: image.height(),
            });
        }
        if !matches!(image.channels(), 3 | 4) {
            return Err(OverlayError::UnsupportedChannels(image.channels()));
        }
        let natural_size = Size::new(image.width() as f64, image.height() as f64);
        Ok(Self {
            image: Arc::new(image),
            natural_size,
        })
    }

    pub fn with_natural_size(mut self, size: Size) -> Result<Self, OverlayError> {
        if size.is_empty() || !size.width.is_finite() || !size.height.is_finite() {
            return Err(OverlayError::InvalidNaturalSize {
                width: size.width,
                height: size.height,
            });
        }
        self.natural_size = size;
        Ok(self)
    }

    pub fn image(&self) -> &Frame {
        &self.image
    }

    pub fn natural_size(&self) -> Size {
        self.natural_size
    }

    /// Image pixels per natural unit along x and y.
    pub fn pixel_scale(&self) -> (f64, f64) {
        (
            self.image.width() as f64 / self.natural_size.width,
            self.image.height() as f64 / self.natural_size.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_size_defaults_to_pixels() {
        let overlay = OverlayDescriptor::new(Frame::filled(30, 35, &[255, 0, 0, 255], 0)).unwrap();
        assert_eq!(overlay.natural_size(), Size::new(30.0, 35.0));
        assert_eq!(overlay.pixel_scale(), (1.0, 1.0));
    }

    #[test]
    fn test_explicit_natural_size() {
        let overlay = OverlayDescriptor::new(Frame::filled(60, 70, &[0, 0, 0], 0))
            .unwrap()
            .with_natural_size(Size::new(30.0, 35.0))
            .unwrap();
        assert_eq!(overlay.natural_size(), Size::new(30.0, 35.0));
        assert_eq!(overlay.pixel_scale(), (2.0, 2.0));
    }

    #[test]
    fn test_rejects_empty_image() {
        let result = OverlayDescriptor::new(Frame::new(vec![], 0, 10, 4, 0));
        assert_eq!(
            result.unwrap_err(),
            OverlayError::EmptyImage {
                width: 0,
                height: 10
            }
        );
    }

    #[test]
    fn test_rejects_grayscale() {
        let result = OverlayDescriptor::new(Frame::filled(2, 2, &[9], 0));
        assert_eq!(result.unwrap_err(), OverlayError::UnsupportedChannels(1));
    }

    #[test]
    fn test_rejects_zero_natural_size() {
        let result = OverlayDescriptor::new(Frame::filled(2, 2, &[0, 0, 0], 0))
            .unwrap()
            .with_natural_size(Size::new(0.0, 5.0));
        assert!(matches!(result, Err(OverlayError::InvalidNaturalSize { .. })));
    }

    #[test]
    fn test_clone_shares_pixels() {
        let overlay = OverlayDescriptor::new(Frame::filled(4, 4, &[1, 2, 3], 0)).unwrap();
        let cloned = overlay.clone();
        assert!(std::ptr::eq(overlay.image(), cloned.image()));
    }
}

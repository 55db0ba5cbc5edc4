//! Cross-thread handoff cells shared by the capture and render sides.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::overlay::domain::overlay_descriptor::OverlayDescriptor;
use crate::shared::frame::Frame;

/// Latest-wins frame mailbox.
///
/// The producer overwrites whatever is waiting; the renderer takes the
/// newest frame. Frames replaced before being taken are counted as dropped.
#[derive(Clone, Default)]
pub struct LatestFrameSlot {
    frame: Arc<Mutex<Option<Frame>>>,
    dropped: Arc<AtomicUsize>,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame`, returning `true` if it replaced an untaken one.
    pub fn publish(&self, frame: Frame) -> bool {
        let replaced = self
            .frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(frame)
            .is_some();
        if replaced {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        replaced
    }

    pub fn take(&self) -> Option<Frame> {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Discards any waiting frame without counting it as dropped.
    pub fn clear(&self) {
        self.take();
    }

    pub fn has_pending(&self) -> bool {
        self.frame
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn dropped_frames(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// The overlay currently drawn on the face.
///
/// Cloned handles share one cell, so any thread may swap the overlay while
/// the pipeline runs. Readers get a whole descriptor, never a partial one.
#[derive(Clone, Default)]
pub struct OverlaySlot {
    overlay: Arc<RwLock<Option<OverlayDescriptor>>>,
}

impl OverlaySlot {
    pub fn new(initial: Option<OverlayDescriptor>) -> Self {
        Self {
            overlay: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn set(&self, overlay: OverlayDescriptor) {
        *self.overlay.write().unwrap_or_else(PoisonError::into_inner) = Some(overlay);
    }

    pub fn clear(&self) {
        *self.overlay.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn snapshot(&self) -> Option<OverlayDescriptor> {
        self.overlay
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: usize) -> Frame {
        Frame::filled(2, 2, &[0, 0, 0], index)
    }

    fn overlay(value: u8) -> OverlayDescriptor {
        OverlayDescriptor::new(Frame::filled(1, 1, &[value, value, value, 255], 0)).unwrap()
    }

    #[test]
    fn test_take_returns_latest_frame() {
        let slot = LatestFrameSlot::new();
        assert!(!slot.publish(frame(0)));
        assert!(slot.publish(frame(1)));
        assert!(slot.publish(frame(2)));

        assert_eq!(slot.take().unwrap().index(), 2);
        assert!(slot.take().is_none());
        assert_eq!(slot.dropped_frames(), 2);
    }

    #[test]
    fn test_clear_is_not_a_drop() {
        let slot = LatestFrameSlot::new();
        slot.publish(frame(0));
        assert!(slot.has_pending());
        slot.clear();
        assert!(!slot.has_pending());
        assert_eq!(slot.dropped_frames(), 0);
    }

    #[test]
    fn test_clones_share_frame_slot() {
        let slot = LatestFrameSlot::new();
        let producer = slot.clone();
        std::thread::spawn(move || {
            for i in 0..10 {
                producer.publish(frame(i));
            }
        })
        .join()
        .unwrap();

        assert_eq!(slot.take().unwrap().index(), 9);
        assert_eq!(slot.dropped_frames(), 9);
    }

    #[test]
    fn test_overlay_slot_set_and_clear() {
        let slot = OverlaySlot::default();
        assert!(slot.snapshot().is_none());

        slot.set(overlay(7));
        assert_eq!(slot.snapshot().unwrap().image().data()[0], 7);

        slot.clear();
        assert!(slot.snapshot().is_none());
    }

    #[test]
    fn test_overlay_slot_set_from_other_thread() {
        let slot = OverlaySlot::new(Some(overlay(1)));
        let handle = slot.clone();
        std::thread::spawn(move || handle.set(overlay(2)))
            .join()
            .unwrap();
        assert_eq!(slot.snapshot().unwrap().image().data()[0], 2);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_set() {
        let slot = OverlaySlot::new(Some(overlay(1)));
        let snapshot = slot.snapshot().unwrap();
        slot.set(overlay(2));
        assert_eq!(snapshot.image().data()[0], 1);
    }
}

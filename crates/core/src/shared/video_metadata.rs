use std::path::PathBuf;
use std::time::Duration;

/// Describes a frame source once it has been opened.
///
/// `fps` is 0 for sources without a native rate (still images).
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

/// Time between frames at `fps`. `None` when the rate is not positive or
/// its period does not fit in a `Duration`.
pub fn frame_interval(fps: f64) -> Option<Duration> {
    if fps.is_nan() || fps <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / fps)
        .ok()
        .filter(|d| !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_construction() {
        let meta = VideoMetadata {
            width: 1280,
            height: 720,
            fps: 30.0,
            total_frames: 240,
            source_path: Some(PathBuf::from("/tmp/frames")),
        };
        assert_eq!(meta.width, 1280);
        assert_eq!(meta.total_frames, 240);
        assert_eq!(meta.source_path, Some(PathBuf::from("/tmp/frames")));
    }

    #[test]
    fn test_frame_interval_at_common_rate() {
        let interval = frame_interval(50.0).unwrap();
        assert_relative_eq!(interval.as_secs_f64(), 0.02, epsilon = 1e-6);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-30.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    #[case::subnormal(1e-320)]
    fn test_frame_interval_unrepresentable(#[case] fps: f64) {
        assert_eq!(frame_interval(fps), None);
    }
}

/// Frames between expression classifications (the first of every N frames).
pub const DEFAULT_THROTTLE_INTERVAL: usize = 8;

pub const DEFAULT_RENDER_FPS: f64 = 30.0;

/// Progress lines are logged every N rendered frames.
pub const DEFAULT_PROGRESS_EVERY: usize = 30;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Overlay assets are looked up as `<asset_name>.<OVERLAY_ASSET_EXTENSION>`.
pub const OVERLAY_ASSET_EXTENSION: &str = "png";

pub const SETTINGS_DIR_NAME: &str = "Facemoji";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

use std::path::{Path, PathBuf};

use crate::expression::domain::expression_label::ExpressionLabel;
use crate::overlay::domain::overlay_catalog::{CatalogError, OverlayCatalog};
use crate::overlay::domain::overlay_descriptor::OverlayDescriptor;
use crate::shared::constants::OVERLAY_ASSET_EXTENSION;
use crate::shared::frame::Frame;

/// Path of the asset for `label` inside `dir`.
pub fn asset_path(dir: &Path, label: ExpressionLabel) -> PathBuf {
    dir.join(format!("{}.{OVERLAY_ASSET_EXTENSION}", label.asset_name()))
}

/// Builds the overlay catalog from `<dir>/<asset_name>.png`, one per label.
///
/// Every image is decoded to RGBA up front; the first missing or
/// undecodable asset aborts the load.
pub fn load_catalog(dir: &Path) -> Result<OverlayCatalog, CatalogError> {
    let mut entries = Vec::with_capacity(ExpressionLabel::ALL.len());
    for label in ExpressionLabel::ALL {
        let path = asset_path(dir, label);
        let image = load_rgba(&path).map_err(|source| CatalogError::Load {
            label,
            path: path.clone(),
            source: Box::new(source),
        })?;
        let overlay =
            OverlayDescriptor::new(image).map_err(|source| CatalogError::Invalid { label, source })?;
        log::debug!(
            "Loaded overlay '{label}' ({}x{}) from {}",
            overlay.image().width(),
            overlay.image().height(),
            path.display()
        );
        entries.push((label, overlay));
    }
    log::info!("Loaded {} overlays from {}", entries.len(), dir.display());
    OverlayCatalog::new(entries)
}

fn load_rgba(path: &Path) -> Result<Frame, image::ImageError> {
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 4, 0))
}

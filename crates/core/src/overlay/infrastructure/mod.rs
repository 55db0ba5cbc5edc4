pub mod cpu_overlay_compositor;
pub mod overlay_asset_loader;

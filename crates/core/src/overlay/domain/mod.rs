pub mod affine_transform;
pub mod frame_compositor;
pub mod overlay_catalog;
pub mod overlay_descriptor;

//! Frame rendering: scene plus timestamp in, premultiplied RGBA8 bitmap out.

/// CPU rasterizer.
pub mod cpu;
/// Bitmap and frame value types.
pub mod frame;
pub(crate) mod raster;
pub(crate) mod text;

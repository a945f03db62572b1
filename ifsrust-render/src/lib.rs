pub mod bounds;
pub mod buffer;
pub mod density;
pub mod error;
pub mod export;
pub mod raster;
pub mod shading;

pub use bounds::{Bounds, Frame};
pub use buffer::RenderBuffer;
pub use density::DensityBuffer;
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
pub use raster::{rasterize, RasterParams, RasterResult};
pub use shading::{parse_color, ShadeMode, Shading};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;

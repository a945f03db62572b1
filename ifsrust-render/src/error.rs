use thiserror::Error;

/// Errors originating from the rasterizing and export pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid padding: {0} (must be finite and in 0.0..0.5)")]
    InvalidPadding(f64),

    #[error("invalid color: '{0}' (expected #rrggbb, #rrggbbaa, or a color name)")]
    InvalidColor(String),

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),
}

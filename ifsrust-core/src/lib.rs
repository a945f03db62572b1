pub mod affine;
pub mod catalog;
pub mod error;
pub mod ifs;
pub mod point;

// Re-export primary types for convenience.
pub use affine::{Affine, Transform};
pub use catalog::Catalog;
pub use error::CoreError;
pub use ifs::{generate, Ifs, DEFAULT_ITERATIONS, DISTRIBUTION_TOLERANCE};
pub use point::Point;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

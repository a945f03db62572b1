use thiserror::Error;

/// Errors originating from IFS construction and sampling.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("an iterated function system needs at least one transformation")]
    EmptySystem,

    #[error(
        "{transformations} transformations paired with {probabilities} probabilities (lengths must match)"
    )]
    LengthMismatch {
        transformations: usize,
        probabilities: usize,
    },

    #[error("probability #{index} is {value} (must be finite and >= 0.0)")]
    NegativeProbability { index: usize, value: f64 },

    #[error("probabilities sum to {sum} (must sum to 1.0)")]
    InvalidDistribution { sum: f64 },
}

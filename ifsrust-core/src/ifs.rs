use rand::Rng;
use tracing::debug;

use crate::affine::{Affine, Transform};
use crate::error::CoreError;
use crate::point::Point;

/// Maximum allowed distance between the probability sum and `1.0`.
pub const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// Iteration count used when the caller has no preference.
pub const DEFAULT_ITERATIONS: usize = 100_000;

/// An iterated function system: `N` transformations paired with a
/// categorical distribution over them.
///
/// Construction validates the pairing once, so every [`Ifs`] value is
/// ready to sample. Sampling is the chaos game: start at the origin, pick a
/// transformation by weight, apply it, record the new point, repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct Ifs<T = Affine> {
    transformations: Vec<T>,
    probabilities: Vec<f64>,
    /// Running sums of `probabilities`, accumulated left to right.
    cumulative: Vec<f64>,
    /// Index chosen when rounding leaves every partial sum at or below the draw.
    fallback: usize,
}

impl<T: Transform> Ifs<T> {
    /// Pair `transformations` with `probabilities`.
    ///
    /// Fails before any sampling can happen when the system is empty, the
    /// two lists differ in length, a weight is negative or non-finite, or the
    /// weights do not sum to `1.0` within [`DISTRIBUTION_TOLERANCE`].
    pub fn new(transformations: Vec<T>, probabilities: Vec<f64>) -> crate::Result<Self> {
        if transformations.is_empty() {
            return Err(CoreError::EmptySystem);
        }
        if transformations.len() != probabilities.len() {
            return Err(CoreError::LengthMismatch {
                transformations: transformations.len(),
                probabilities: probabilities.len(),
            });
        }
        if let Some((index, &value)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(CoreError::NegativeProbability { index, value });
        }

        let cumulative: Vec<f64> = probabilities
            .iter()
            .scan(0.0, |acc, &p| {
                *acc += p;
                Some(*acc)
            })
            .collect();
        let sum = cumulative.last().copied().unwrap_or(0.0);
        if (sum - 1.0).abs() >= DISTRIBUTION_TOLERANCE {
            return Err(CoreError::InvalidDistribution { sum });
        }

        // The sum is ~1.0, so at least one weight is positive.
        let fallback = probabilities
            .iter()
            .rposition(|&p| p > 0.0)
            .unwrap_or(probabilities.len() - 1);

        Ok(Self {
            transformations,
            probabilities,
            cumulative,
            fallback,
        })
    }

    pub fn transformations(&self) -> &[T] {
        &self.transformations
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Number of transformations in the system (always `>= 1`).
    pub fn map_count(&self) -> usize {
        self.transformations.len()
    }

    /// Pick a transformation index for a uniform draw `r` in `[0, 1)`.
    ///
    /// Returns the first index whose running probability sum exceeds `r`.
    /// If rounding keeps every partial sum at or below `r`, the last index
    /// with a positive weight is returned.
    #[inline]
    pub fn select(&self, r: f64) -> usize {
        self.cumulative
            .iter()
            .position(|&acc| r < acc)
            .unwrap_or(self.fallback)
    }

    /// Run the chaos game for `iterations` steps, drawing from `rng`.
    ///
    /// The returned sequence has exactly `iterations` points and does not
    /// include the starting origin.
    pub fn sample<R: Rng + ?Sized>(&self, iterations: usize, rng: &mut R) -> Vec<Point> {
        self.sample_with(iterations, || rng.gen::<f64>())
    }

    /// Run the chaos game with an explicit source of uniform draws.
    ///
    /// `draw` is called exactly once per iteration and must yield values in
    /// `[0, 1)`.
    pub fn sample_with<D: FnMut() -> f64>(&self, iterations: usize, mut draw: D) -> Vec<Point> {
        debug!(maps = self.map_count(), iterations, "Sampling IFS");

        let mut points = Vec::with_capacity(iterations);
        let mut current = Point::ORIGIN;
        for _ in 0..iterations {
            let index = self.select(draw());
            current = self.transformations[index].apply(current);
            points.push(current);
        }
        points
    }
}

/// Validate a system and sample it in one call.
///
/// Equivalent to [`Ifs::new`] followed by [`Ifs::sample`]. On a validation
/// error nothing is drawn from `rng`.
pub fn generate<T: Transform, R: Rng + ?Sized>(
    transformations: Vec<T>,
    probabilities: Vec<f64>,
    iterations: usize,
    rng: &mut R,
) -> crate::Result<Vec<Point>> {
    let ifs = Ifs::new(transformations, probabilities)?;
    Ok(ifs.sample(iterations, rng))
}

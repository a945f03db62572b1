use serde::{Deserialize, Serialize};

use crate::point::Point;

/// A map from the plane to itself.
///
/// Designed for **static dispatch**: [`Ifs`](crate::Ifs) is generic over
/// `T: Transform`, so the per-step call inlines into the sampling loop.
/// Implementations must be pure; the sampler may call `apply` from any thread.
pub trait Transform {
    fn apply(&self, p: Point) -> Point;
}

/// An affine map `(x, y) -> (a·x + b·y + e, c·x + d·y + f)`.
///
/// Stored as plain coefficients rather than a closure so that systems can be
/// compared, serialized into run configs, and printed in logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    #[inline]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Uniform scale by `s` followed by a translation of `(tx, ty)`.
    #[inline]
    pub const fn scale_translate(s: f64, tx: f64, ty: f64) -> Self {
        Self::new(s, 0.0, 0.0, s, tx, ty)
    }

    /// Determinant of the linear part: the factor by which the map scales area.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform for Affine {
    #[inline]
    fn apply(&self, p: Point) -> Point {
        Point {
            x: self.a * p.x + self.b * p.y + self.e,
            y: self.c * p.x + self.d * p.y + self.f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn identity_is_a_no_op() {
        let p = Point::new(-0.3, 7.5);
        assert_eq!(Affine::IDENTITY.apply(p), p);
        assert_eq!(Affine::default(), Affine::IDENTITY);
    }

    #[test]
    fn apply_uses_row_major_coefficients() {
        let m = Affine::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        let q = m.apply(Point::new(1.0, 1.0));
        assert!((q.x - 8.0).abs() < EPSILON);
        assert!((q.y - 13.0).abs() < EPSILON);
    }

    #[test]
    fn scale_translate_halves_and_shifts() {
        let m = Affine::scale_translate(0.5, 0.25, 0.5);
        let q = m.apply(Point::new(1.0, 1.0));
        assert_eq!(q, Point::new(0.75, 1.0));
        assert!((m.determinant() - 0.25).abs() < EPSILON);
    }

    #[test]
    fn fern_stem_collapses_x() {
        let stem = Affine::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0);
        let q = stem.apply(Point::new(3.0, 2.0));
        assert_eq!(q.x, 0.0);
        assert!((q.y - 0.32).abs() < EPSILON);
        assert_eq!(stem.determinant(), 0.0);
    }

    #[test]
    fn deserializes_from_coefficient_object() {
        let json = r#"{"a":0.5,"b":0.0,"c":0.0,"d":0.5,"e":0.5,"f":0.0}"#;
        let m: Affine = serde_json::from_str(json).unwrap();
        assert_eq!(m, Affine::scale_translate(0.5, 0.5, 0.0));
    }
}

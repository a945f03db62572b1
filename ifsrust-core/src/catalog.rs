//! Built-in iterated function systems.
//!
//! Coefficients use the [`Affine`] convention `(a·x + b·y + e, c·x + d·y + f)`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::affine::Affine;
use crate::ifs::Ifs;

const SQRT3_6: f64 = 0.288_675_134_594_812_9; // √3 / 6

/// A named fractal with a fixed transformation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Catalog {
    Sierpinski,
    BarnsleyFern,
    SierpinskiCarpet,
    KochCurve,
    FractalTree,
}

impl Catalog {
    pub const ALL: [Catalog; 5] = [
        Self::Sierpinski,
        Self::BarnsleyFern,
        Self::SierpinskiCarpet,
        Self::KochCurve,
        Self::FractalTree,
    ];

    /// Stable identifier, used on the command line and as the output file stem.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sierpinski => "sierpinski",
            Self::BarnsleyFern => "barnsley-fern",
            Self::SierpinskiCarpet => "sierpinski-carpet",
            Self::KochCurve => "koch-curve",
            Self::FractalTree => "fractal-tree",
        }
    }

    /// Human-readable title.
    pub fn label(self) -> &'static str {
        match self {
            Self::Sierpinski => "Sierpinski Triangle",
            Self::BarnsleyFern => "Barnsley Fern",
            Self::SierpinskiCarpet => "Sierpinski Carpet",
            Self::KochCurve => "Koch Curve",
            Self::FractalTree => "Fractal Tree",
        }
    }

    pub fn transformations(self) -> Vec<Affine> {
        match self {
            Self::Sierpinski => vec![
                Affine::scale_translate(0.5, 0.0, 0.0),
                Affine::scale_translate(0.5, 0.5, 0.0),
                Affine::scale_translate(0.5, 0.25, 0.5),
            ],
            Self::BarnsleyFern => vec![
                Affine::new(0.0, 0.0, 0.0, 0.16, 0.0, 0.0),
                Affine::new(0.85, 0.04, -0.04, 0.85, 0.0, 1.6),
                Affine::new(0.2, -0.26, 0.23, 0.22, 0.0, 1.6),
                Affine::new(-0.15, 0.28, 0.26, 0.24, 0.0, 0.44),
            ],
            Self::SierpinskiCarpet => {
                let third = 1.0 / 3.0;
                (0..3)
                    .flat_map(|row| (0..3).map(move |col| (row, col)))
                    .filter(|&cell| cell != (1, 1))
                    .map(|(row, col)| {
                        Affine::scale_translate(third, col as f64 * third, row as f64 * third)
                    })
                    .collect()
            }
            Self::KochCurve => vec![
                Affine::scale_translate(1.0 / 3.0, 0.0, 0.0),
                // Rising segment, rotated +60°.
                Affine::new(1.0 / 6.0, -SQRT3_6, SQRT3_6, 1.0 / 6.0, 1.0 / 3.0, 0.0),
                // Falling segment, rotated -60°.
                Affine::new(1.0 / 6.0, SQRT3_6, -SQRT3_6, 1.0 / 6.0, 0.5, SQRT3_6),
                Affine::scale_translate(1.0 / 3.0, 2.0 / 3.0, 0.0),
            ],
            Self::FractalTree => vec![
                Affine::new(0.0, 0.0, 0.0, 0.5, 0.0, 0.0),
                Affine::new(0.42, -0.42, 0.42, 0.42, 0.0, 0.2),
                Affine::new(0.42, 0.42, -0.42, 0.42, 0.0, 0.2),
                Affine::new(0.1, 0.0, 0.0, 0.1, 0.0, 0.2),
            ],
        }
    }

    pub fn probabilities(self) -> Vec<f64> {
        match self {
            Self::Sierpinski => vec![1.0 / 3.0; 3],
            Self::BarnsleyFern => vec![0.01, 0.85, 0.07, 0.07],
            Self::SierpinskiCarpet => vec![0.125; 8],
            Self::KochCurve => vec![0.25; 4],
            Self::FractalTree => vec![0.05, 0.4, 0.4, 0.15],
        }
    }

    /// The validated system for this entry.
    pub fn system(self) -> crate::Result<Ifs<Affine>> {
        Ifs::new(self.transformations(), self.probabilities())
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a name matches no built-in system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFractal(pub String);

impl fmt::Display for UnknownFractal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known: Vec<&str> = Catalog::ALL.iter().map(|c| c.name()).collect();
        write!(f, "unknown fractal '{}' (known: {})", self.0, known.join(", "))
    }
}

impl std::error::Error for UnknownFractal {}

impl FromStr for Catalog {
    type Err = UnknownFractal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| UnknownFractal(s.to_string()))
    }
}

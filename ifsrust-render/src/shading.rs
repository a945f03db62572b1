use rayon::prelude::*;

use crate::buffer::RenderBuffer;
use crate::density::DensityBuffer;
use crate::error::RenderError;

pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const BLACK: [u8; 4] = [0, 0, 0, 255];

const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("black", BLACK),
    ("white", WHITE),
    ("green", [0, 128, 0, 255]),
    ("darkgreen", [0, 100, 0, 255]),
    ("forestgreen", [34, 139, 34, 255]),
    ("red", [255, 0, 0, 255]),
    ("crimson", [220, 20, 60, 255]),
    ("blue", [0, 0, 255, 255]),
    ("navy", [0, 0, 128, 255]),
    ("purple", [128, 0, 128, 255]),
    ("orange", [255, 165, 0, 255]),
    ("brown", [165, 42, 42, 255]),
    ("saddlebrown", [139, 69, 19, 255]),
    ("gray", [128, 128, 128, 255]),
];

/// How hit counts map to ink intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadeMode {
    /// Any hit paints full ink, like a scatter plot of tiny markers.
    #[default]
    Flat,
    /// Ink strength grows with `ln(1 + hits)`, revealing the invariant measure.
    LogDensity,
}

/// Ink, background, and mode used to turn a [`DensityBuffer`] into pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shading {
    pub ink: [u8; 4],
    pub background: [u8; 4],
    pub mode: ShadeMode,
}

impl Shading {
    /// Flat `ink` on white.
    pub fn new(ink: [u8; 4]) -> Self {
        Self {
            ink,
            background: WHITE,
            mode: ShadeMode::Flat,
        }
    }

    pub fn with_mode(self, mode: ShadeMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_background(self, background: [u8; 4]) -> Self {
        Self { background, ..self }
    }

    /// Color of a pixel hit `count` times when the densest pixel has `max_count` hits.
    pub fn color(&self, count: u32, max_count: u32) -> [u8; 4] {
        self.shade(count, log_norm(max_count))
    }

    #[inline]
    fn shade(&self, count: u32, inv_log_max: f64) -> [u8; 4] {
        if count == 0 {
            return self.background;
        }
        match self.mode {
            ShadeMode::Flat => self.ink,
            ShadeMode::LogDensity => {
                let t = ((count as f64).ln_1p() * inv_log_max).clamp(0.0, 1.0);
                lerp(self.background, self.ink, t)
            }
        }
    }

    /// Shade an entire density buffer into an RGBA pixel buffer.
    pub fn colorize(&self, density: &DensityBuffer) -> RenderBuffer {
        let inv_log_max = log_norm(density.max_count());
        let mut pixels = vec![0u8; density.counts.len() * 4];
        pixels
            .par_chunks_mut(4)
            .zip(density.counts.par_iter())
            .for_each(|(pixel, &count)| {
                pixel.copy_from_slice(&self.shade(count, inv_log_max));
            });
        RenderBuffer {
            width: density.width,
            height: density.height,
            pixels,
        }
    }
}

impl Default for Shading {
    fn default() -> Self {
        Self::new(BLACK)
    }
}

/// `1 / ln(1 + max)`, or `0` for an empty buffer.
fn log_norm(max_count: u32) -> f64 {
    if max_count == 0 {
        0.0
    } else {
        1.0 / (max_count as f64).ln_1p()
    }
}

fn lerp(from: [u8; 4], to: [u8; 4], t: f64) -> [u8; 4] {
    std::array::from_fn(|i| {
        let v = from[i] as f64 + (to[i] as f64 - from[i] as f64) * t;
        v.round().clamp(0.0, 255.0) as u8
    })
}

/// Parse `#rrggbb`, `#rrggbbaa`, or a color name such as `green`.
pub fn parse_color(s: &str) -> crate::Result<[u8; 4]> {
    let trimmed = s.trim();
    let invalid = || RenderError::InvalidColor(s.to_string());

    if let Some(hex) = trimmed.strip_prefix('#') {
        let well_formed = matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
        if !well_formed {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        return Ok([channel(0)?, channel(2)?, channel(4)?, alpha]);
    }

    let lower = trimmed.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|&(_, rgba)| rgba)
        .ok_or_else(invalid)
}

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use ifsrust_core::Point;

use crate::bounds::{Bounds, Frame};
use crate::density::DensityBuffer;
use crate::error::RenderError;

/// Points binned per Rayon work item.
const CHUNK_SIZE: usize = 16 * 1024;

/// Output image geometry for [`rasterize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterParams {
    pub width: u32,
    pub height: u32,
    /// Margin added around the attractor, as a fraction of its larger extent.
    pub padding: f64,
}

impl RasterParams {
    pub const DEFAULT_SIZE: u32 = 1024;
    pub const DEFAULT_PADDING: f64 = 0.02;

    pub fn new(width: u32, height: u32, padding: f64) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        if !(0.0..0.5).contains(&padding) {
            return Err(RenderError::InvalidPadding(padding));
        }
        Ok(Self {
            width,
            height,
            padding,
        })
    }
}

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_SIZE,
            height: Self::DEFAULT_SIZE,
            padding: Self::DEFAULT_PADDING,
        }
    }
}

/// The result of rasterizing a point sequence.
///
/// Contains raw hit counts (no coloring); apply a [`Shading`](crate::Shading)
/// to produce displayable pixels.
pub struct RasterResult {
    pub density: DensityBuffer,
    /// Plane-to-pixel mapping used, or `None` when no point was finite.
    pub frame: Option<Frame>,
    pub points_plotted: usize,
    /// Points that landed outside the image or were not finite.
    pub points_clipped: usize,
    pub elapsed: Duration,
}

/// Bin a point sequence into a density image.
///
/// The frame is fitted to the finite points (plus padding), so every finite
/// point lands in the image. Points are binned in parallel chunks, each into
/// its own buffer, and the partial buffers are summed.
pub fn rasterize(points: &[Point], params: &RasterParams) -> crate::Result<RasterResult> {
    let start = Instant::now();
    let (width, height) = (params.width, params.height);
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidDimensions { width, height });
    }

    let Some(bounds) = Bounds::from_points(points) else {
        debug!(points = points.len(), "No finite points to rasterize");
        return Ok(RasterResult {
            density: DensityBuffer::new(width, height),
            frame: None,
            points_plotted: 0,
            points_clipped: points.len(),
            elapsed: start.elapsed(),
        });
    };

    let frame = Frame::new(&bounds.padded(params.padding), width, height)?;
    debug!(
        points = points.len(),
        width,
        height,
        scale = frame.scale,
        "Starting rasterization"
    );

    let (density, points_plotted) = points
        .par_chunks(CHUNK_SIZE)
        .fold(
            || (DensityBuffer::new(width, height), 0usize),
            |(mut buf, mut plotted), chunk| {
                for &p in chunk {
                    if let Some((x, y)) = frame.point_to_pixel(p) {
                        buf.increment(x, y);
                        plotted += 1;
                    }
                }
                (buf, plotted)
            },
        )
        .reduce(
            || (DensityBuffer::new(width, height), 0usize),
            |(mut a, na), (b, nb)| {
                a.merge(&b);
                (a, na + nb)
            },
        );

    let points_clipped = points.len() - points_plotted;
    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        points_plotted,
        points_clipped,
        covered = density.covered_pixels(),
        "Rasterization complete"
    );

    Ok(RasterResult {
        density,
        frame: Some(frame),
        points_plotted,
        points_clipped,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_validation() {
        assert!(RasterParams::new(0, 10, 0.0).is_err());
        assert!(RasterParams::new(10, 0, 0.0).is_err());
        assert!(RasterParams::new(10, 10, -0.1).is_err());
        assert!(RasterParams::new(10, 10, 0.5).is_err());
        assert!(RasterParams::new(10, 10, f64::NAN).is_err());
        assert!(RasterParams::new(10, 10, 0.1).is_ok());
    }

    #[test]
    fn empty_input_gives_blank_image() {
        let params = RasterParams::new(8, 6, 0.0).unwrap();
        let result = rasterize(&[], &params).unwrap();
        assert!(result.frame.is_none());
        assert_eq!(result.density.counts.len(), 48);
        assert_eq!(result.density.max_count(), 0);
        assert_eq!(result.points_plotted, 0);
    }

    #[test]
    fn every_finite_point_is_plotted() {
        let points: Vec<Point> = (0..1000)
            .map(|i| Point::new(i as f64, (i % 7) as f64))
            .chain(std::iter::once(Point::new(f64::NAN, 0.0)))
            .collect();
        let params = RasterParams::new(64, 64, 0.0).unwrap();
        let result = rasterize(&points, &params).unwrap();
        assert_eq!(result.points_plotted, 1000);
        assert_eq!(result.points_clipped, 1);
        assert_eq!(result.density.total_hits(), 1000);
    }

    #[test]
    fn repeated_point_accumulates() {
        let mut points = vec![Point::new(0.0, 0.0); 50];
        points.push(Point::new(1.0, 1.0));
        let params = RasterParams::new(10, 10, 0.0).unwrap();
        let result = rasterize(&points, &params).unwrap();
        assert_eq!(result.density.get(0, 9), 50);
        assert_eq!(result.density.get(9, 0), 1);
        assert_eq!(result.density.max_count(), 50);
    }

    #[test]
    fn parallel_binning_matches_serial_count() {
        // More than one chunk so the reduce step is exercised.
        let points: Vec<Point> = (0..(CHUNK_SIZE * 3 + 17))
            .map(|i| Point::new((i % 101) as f64, (i % 37) as f64))
            .collect();
        let params = RasterParams::new(32, 32, 0.01).unwrap();
        let result = rasterize(&points, &params).unwrap();

        let frame = result.frame.unwrap();
        let mut serial = DensityBuffer::new(32, 32);
        for &p in &points {
            if let Some((x, y)) = frame.point_to_pixel(p) {
                serial.increment(x, y);
            }
        }
        assert_eq!(result.density, serial);
    }
}

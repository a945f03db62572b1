use ifsrust_core::Point;

use crate::error::RenderError;

/// Axis-aligned bounding box of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Smallest box containing every finite point, or `None` if there is none.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        points
            .iter()
            .filter(|p| p.is_finite())
            .fold(None, |acc: Option<Self>, p| {
                Some(match acc {
                    None => Self {
                        min_x: p.x,
                        max_x: p.x,
                        min_y: p.y,
                        max_y: p.y,
                    },
                    Some(b) => Self {
                        min_x: b.min_x.min(p.x),
                        max_x: b.max_x.max(p.x),
                        min_y: b.min_y.min(p.y),
                        max_y: b.max_y.max(p.y),
                    },
                })
            })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow every side by `fraction` of the larger extent.
    pub fn padded(&self, fraction: f64) -> Self {
        let pad = self.width().max(self.height()) * fraction;
        Self {
            min_x: self.min_x - pad,
            max_x: self.max_x + pad,
            min_y: self.min_y - pad,
            max_y: self.max_y + pad,
        }
    }
}

/// Maps a region of the plane onto a pixel grid.
///
/// The frame is centred on the region and uses one scale for both axes, so
/// the attractor keeps its aspect ratio; the shorter axis gets empty margins.
/// Row `0` is the top of the image: larger `y` maps to smaller rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Centre of the frame in plane coordinates.
    pub center: Point,

    /// Plane units per pixel.
    pub scale: f64,

    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Fit `bounds` into a `width × height` image.
    ///
    /// A degenerate region (a single point) gets an arbitrary unit-sized frame
    /// around it.
    pub fn new(bounds: &Bounds, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let mut scale = (bounds.width() / width as f64).max(bounds.height() / height as f64);
        if scale <= 0.0 || !scale.is_finite() {
            scale = 1.0 / width.max(height) as f64;
        }
        Ok(Self {
            center: bounds.center(),
            scale,
            width,
            height,
        })
    }

    /// Pixel that `p` falls into, or `None` if it lies outside the image.
    ///
    /// Points exactly on the right or bottom edge of the frame belong to the
    /// last column or row.
    #[inline]
    pub fn point_to_pixel(&self, p: Point) -> Option<(u32, u32)> {
        if !p.is_finite() {
            return None;
        }
        let w = self.width as f64;
        let h = self.height as f64;
        let fx = (p.x - self.center.x) / self.scale + w / 2.0;
        let fy = (self.center.y - p.y) / self.scale + h / 2.0;
        if !(0.0..=w).contains(&fx) || !(0.0..=h).contains(&fy) {
            return None;
        }
        let px = (fx as u32).min(self.width - 1);
        let py = (fy as u32).min(self.height - 1);
        Some((px, py))
    }

    /// Centre of pixel `(px, py)` in plane coordinates.
    pub fn pixel_to_point(&self, px: u32, py: u32) -> Point {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        Point::new(
            self.center.x + (px as f64 + 0.5 - half_w) * self.scale,
            self.center.y - (py as f64 + 0.5 - half_h) * self.scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    fn unit_square() -> Bounds {
        Bounds {
            min_x: 0.0,
            max_x: 1.0,
            min_y: 0.0,
            max_y: 1.0,
        }
    }

    #[test]
    fn bounds_ignore_non_finite_points() {
        let points = [
            Point::new(1.0, -2.0),
            Point::new(f64::NAN, 100.0),
            Point::new(-3.0, 4.0),
            Point::new(f64::INFINITY, 0.0),
        ];
        let b = Bounds::from_points(&points).unwrap();
        assert_eq!(b.min_x, -3.0);
        assert_eq!(b.max_x, 1.0);
        assert_eq!(b.min_y, -2.0);
        assert_eq!(b.max_y, 4.0);
    }

    #[test]
    fn bounds_of_nothing() {
        assert!(Bounds::from_points(&[]).is_none());
        assert!(Bounds::from_points(&[Point::new(f64::NAN, f64::NAN)]).is_none());
    }

    #[test]
    fn padding_uses_larger_extent() {
        let b = Bounds {
            min_x: 0.0,
            max_x: 10.0,
            min_y: 0.0,
            max_y: 2.0,
        }
        .padded(0.1);
        assert!((b.min_x + 1.0).abs() < EPSILON);
        assert!((b.max_y - 3.0).abs() < EPSILON);
    }

    #[test]
    fn frame_rejects_zero_dimensions() {
        assert!(Frame::new(&unit_square(), 0, 10).is_err());
        assert!(Frame::new(&unit_square(), 10, 0).is_err());
    }

    #[test]
    fn corners_map_to_corner_pixels() {
        let f = Frame::new(&unit_square(), 100, 100).unwrap();
        assert_eq!(f.point_to_pixel(Point::new(0.0, 1.0)), Some((0, 0)));
        assert_eq!(f.point_to_pixel(Point::new(1.0, 0.0)), Some((99, 99)));
        assert_eq!(f.point_to_pixel(Point::new(0.5, 0.5)), Some((50, 50)));
        assert_eq!(f.point_to_pixel(Point::new(1.5, 0.5)), None);
        assert_eq!(f.point_to_pixel(Point::new(0.5, f64::NAN)), None);
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        // A tall region in a square image: x gets margins, y fills the frame.
        let tall = Bounds {
            min_x: 0.0,
            max_x: 1.0,
            min_y: 0.0,
            max_y: 4.0,
        };
        let f = Frame::new(&tall, 100, 100).unwrap();
        assert!((f.scale - 0.04).abs() < EPSILON);
        let (left, _) = f.point_to_pixel(Point::new(0.0, 2.0)).unwrap();
        let (right, _) = f.point_to_pixel(Point::new(1.0, 2.0)).unwrap();
        assert_eq!(right - left, 25);
    }

    #[test]
    fn degenerate_region_gets_a_frame() {
        let single = Bounds::from_points(&[Point::new(2.0, 3.0)]).unwrap();
        let f = Frame::new(&single, 64, 32).unwrap();
        assert!(f.scale > 0.0);
        assert_eq!(f.point_to_pixel(Point::new(2.0, 3.0)), Some((32, 16)));
    }

    #[test]
    fn pixel_centre_round_trips() {
        let f = Frame::new(&unit_square(), 40, 40).unwrap();
        let p = f.pixel_to_point(7, 30);
        assert_eq!(f.point_to_pixel(p), Some((7, 30)));
    }
}

//! Basic 2D types and unit conversion.
//!
//! - `Point`: image coordinates in pixels (`nalgebra::Vector2<f64>`), exact equality.
//! - `BoundingBox`: axis-aligned box used as the Monte Carlo sampling window.
//! - `to_pixel_units` / `to_metric_units`: scaling by the per-profile pixel width.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A point in image coordinates (pixels).
pub type Point = Vector2<f64>;

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    (a - b).norm()
}

/// Axis-aligned bounding box `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Smallest box holding all `points`; `None` for an empty slice.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = *points.first()?;
        let mut bb = Self {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            bb.min.x = bb.min.x.min(p.x);
            bb.min.y = bb.min.y.min(p.y);
            bb.max.x = bb.max.x.max(p.x);
            bb.max.y = bb.max.y.max(p.y);
        }
        Some(bb)
    }

    /// Grow the box by `margin` on every side.
    #[inline]
    pub fn expand(&self, margin: f64) -> Self {
        let m = Vector2::new(margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Convert a length in metric units to pixels.
#[inline]
pub fn to_pixel_units(x: f64, pixel_width: f64) -> f64 {
    x / pixel_width
}

/// Convert a length in pixels to metric units.
#[inline]
pub fn to_metric_units(x: f64, pixel_width: f64) -> f64 {
    x * pixel_width
}

/// Convert an area in square pixels to square metric units.
#[inline]
pub fn to_metric_area(x: f64, pixel_width: f64) -> f64 {
    x * pixel_width * pixel_width
}

use std::cmp::Ordering;

use super::segment::cross;
use super::types::Point;

/// Andrew’s monotone chain convex hull (returns hull in CCW order).
///
/// Duplicates are removed first; one or two distinct input points yield a
/// one- or two-point hull. Collinear boundary points are dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<_> = points.to_vec();
    pts.sort_by(|a, b| match a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal) {
        Ordering::Equal => a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal),
        o => o,
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }
    let mut lower: Vec<Point> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Point> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    let mut hull = lower;
    hull.extend(upper);
    hull
}

/// Shoelace sum over the implicitly closed ring: twice the signed area.
pub(crate) fn shoelace(verts: &[Point]) -> f64 {
    let n = verts.len();
    (0..n)
        .map(|i| {
            let p = verts[i];
            let q = verts[(i + 1) % n];
            p.x * q.y - q.x * p.y
        })
        .sum()
}

/// Area centroid of the implicitly closed ring; `None` when the area vanishes.
pub(crate) fn polygon_area_centroid(verts: &[Point]) -> Option<Point> {
    if verts.len() < 3 {
        return None;
    }
    let mut a: f64 = 0.0;
    let mut cx: f64 = 0.0;
    let mut cy: f64 = 0.0;
    for i in 0..verts.len() {
        let p = verts[i];
        let q = verts[(i + 1) % verts.len()];
        let cross = p.x * q.y - q.x * p.y;
        a += cross;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    a *= 0.5;
    if a.abs() < 1e-18 {
        return None;
    }
    Some(Point::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Arithmetic mean of the points; `None` for an empty slice.
pub(crate) fn mean_point(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Point::zeros(), |acc, p| acc + p);
    Some(sum / points.len() as f64)
}

//! Signed perpendicular distance and lateral (along-path) distance.

use crate::geom2::{Path, Point};

use super::Polarity;

/// Perpendicular distance from `p` to `path`, signed by `polarity`.
///
/// Scans all segments keeping the last minimal distance (`<=`). The result is
/// `None` when that minimal segment was only approached off its span, unless
/// `on_segment_required` is false.
///
/// Sign: with a negative reference point, points on the same side (even
/// number of path crossings on the way to it) get negative distances; with a
/// positive reference point, points on the other side (odd number) do.
/// Without polarity the distance is unsigned.
pub fn perpend_dist(
    p: Point,
    path: &Path,
    polarity: Option<Polarity>,
    on_segment_required: bool,
) -> Option<f64> {
    let mut mindist = f64::INFINITY;
    let mut on_path = false;
    for i in 0..path.num_segments() {
        let (on_segment, d) = path.distance_to_segment(p, i);
        if d <= mindist {
            mindist = d;
            on_path = on_segment || !on_segment_required;
        }
    }
    if !on_path {
        return None;
    }
    let negate = match polarity {
        Some(Polarity::Negative(r)) => path.crossing_number(p, r) % 2 == 0,
        Some(Polarity::Positive(r)) => path.crossing_number(p, r) % 2 != 0,
        None => false,
    };
    Some(if negate { -mindist } else { mindist })
}

/// Distance along `path` from the projection of `p` to the path's center point.
///
/// A point beyond the ends of the path is projected on the extension of the
/// nearer end segment, so the normalized value exceeds 1 there.
pub fn lateral_dist(p: Point, path: &Path) -> Option<f64> {
    let from = path.project_or_extend(p)?;
    let center = path.center_point();
    let mut to = path.project_or_extend(center)?;
    to.point = center;
    Some(path.walk_between(from, to))
}

/// Distance along `path` between the projections of `a` and `b`.
///
/// `None` if either point has no projection within the path's span.
pub fn lateral_dist_between(a: Point, b: Point, path: &Path) -> Option<f64> {
    let pa = path.project(a)?;
    let pb = path.project(b)?;
    Some(path.walk_between(pa, pb))
}

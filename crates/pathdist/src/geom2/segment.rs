//! Segment predicates: intersection, point–segment distance, projection, crossing numbers.

use super::types::{distance, Point};

/// Signed area of the triangle `(o, a, b)` times two; positive for a CCW turn.
#[inline]
pub(crate) fn cross(o: Point, a: Point, b: Point) -> f64 {
    let oa = a - o;
    let ob = b - o;
    oa.x * ob.y - oa.y * ob.x
}

/// True iff segments `p1p2` and `q1q2` cross.
///
/// Segments sharing an endpoint never count as crossing, and neither do
/// parallel (including collinear) segments. Touching at an interior point
/// of one segment counts.
pub fn segment_intersection(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    if p1 == q1 || p1 == q2 || p2 == q1 || p2 == q2 {
        return false;
    }
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.x * s.y - r.y * s.x;
    if denom == 0.0 {
        return false;
    }
    let qp = q1 - p1;
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

/// Parameter `t` of the orthogonal projection of `p` on the line through `a`, `b`
/// (`a + t (b - a)`), and the projected point. `None` for a zero-length segment.
#[inline]
pub fn project_on_line(p: Point, a: Point, b: Point) -> Option<(f64, Point)> {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return None;
    }
    let t = (p - a).dot(&ab) / len2;
    Some((t, a + ab * t))
}

/// Distance from `p` to segment `ab`.
///
/// Returns `(on_segment, d)`: when the orthogonal projection falls within the
/// segment's span, `d` is the perpendicular distance and `on_segment` is true;
/// otherwise `d` is the distance to the nearer endpoint.
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> (bool, f64) {
    match project_on_line(p, a, b) {
        Some((t, proj)) if (0.0..=1.0).contains(&t) => (true, distance(p, proj)),
        _ => (false, distance(p, a).min(distance(p, b))),
    }
}

/// True iff the crossing segment `from → to` passes over path segment `ab`,
/// counted half-open on the path side.
///
/// A path node lying exactly on the line through `from` and `to` is treated
/// as being on its non-positive side, as in ray casting: of the two path
/// segments meeting at such a node only one counts, and a path that touches
/// the line without passing to the other side counts zero times. Segments
/// lying on the line never count.
pub(crate) fn crosses_half_open(from: Point, to: Point, a: Point, b: Point) -> bool {
    let sa = cross(from, to, a);
    let sb = cross(from, to, b);
    if (sa > 0.0) == (sb > 0.0) {
        return false;
    }
    // sa != sb here, so the lines are not parallel
    let r = to - from;
    let s = b - a;
    let denom = r.x * s.y - r.y * s.x;
    let ap = a - from;
    let t = (ap.x * s.y - ap.y * s.x) / denom;
    (0.0..=1.0).contains(&t)
}

/// Number of consecutive-node segments of `nodes` crossed by segment `from → to`.
///
/// Uses the half-open rule of [`crosses_half_open`], so a line through a
/// node counts as one crossing when the path passes through it.
pub fn segment_crossing_number(nodes: &[Point], from: Point, to: Point) -> usize {
    nodes
        .windows(2)
        .filter(|w| crosses_half_open(from, to, w[0], w[1]))
        .count()
}

//! Paths: ordered polylines (profile borders) and implicitly closed polygons (holes, hulls).
//!
//! Invariants
//! - No two consecutive nodes coincide; a trailing node equal to the first is
//!   dropped on construction (it would only produce a zero-length segment).
//! - Segment `i` joins `nodes[i]` and `nodes[i + 1]`; a closed path has one
//!   extra segment from the last node back to the first.
//! - `area`/`centroid` always treat the node ring as closed, also for open
//!   paths (the polygon formed by drawing a line between the end nodes).

use serde::Serialize;

use super::segment::{
    crosses_half_open, point_segment_distance, project_on_line, segment_intersection,
};
use super::types::{distance, BoundingBox, Point};
use super::util::{mean_point, polygon_area_centroid, shoelace};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Path {
    nodes: Vec<Point>,
    closed: bool,
}

/// Orthogonal projection of a point on a path: the projected point and the
/// index of the segment it lies on (or on whose extension it lies).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub point: Point,
    pub segment: usize,
}

impl Path {
    /// Open polyline (profile border).
    pub fn open(nodes: Vec<Point>) -> Self {
        Self {
            nodes: normalize_nodes(nodes),
            closed: false,
        }
    }

    /// Implicitly closed polygon (hole, hull).
    pub fn closed(nodes: Vec<Point>) -> Self {
        Self {
            nodes: normalize_nodes(nodes),
            closed: true,
        }
    }

    #[inline]
    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    pub fn first(&self) -> Option<Point> {
        self.nodes.first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<Point> {
        self.nodes.last().copied()
    }

    /// Number of segments (including the closing one for closed paths).
    pub fn num_segments(&self) -> usize {
        match self.nodes.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    /// Endpoints of segment `i`. Panics if `i >= num_segments()`.
    #[inline]
    pub fn segment(&self, i: usize) -> (Point, Point) {
        let j = (i + 1) % self.nodes.len();
        (self.nodes[i], self.nodes[j])
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        (0..self.num_segments()).map(move |i| self.segment(i))
    }

    /// Sum of segment lengths.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| distance(a, b)).sum()
    }

    /// Shoelace area of the node ring (absolute value).
    pub fn area(&self) -> f64 {
        (0.5 * shoelace(&self.nodes)).abs()
    }

    /// Area centroid of the node ring; falls back to the mean of the nodes
    /// when the ring has no area (fewer than three nodes or collinear).
    pub fn centroid(&self) -> Point {
        polygon_area_centroid(&self.nodes)
            .or_else(|| mean_point(&self.nodes))
            .unwrap_or_else(Point::zeros)
    }

    /// Midpoint of the two end nodes.
    pub fn center_point(&self) -> Point {
        match (self.first(), self.last()) {
            (Some(a), Some(b)) => (a + b) / 2.0,
            _ => Point::zeros(),
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.nodes)
    }

    /// Distance from `p` to segment `i`, see [`point_segment_distance`].
    #[inline]
    pub fn distance_to_segment(&self, p: Point, i: usize) -> (bool, f64) {
        let (a, b) = self.segment(i);
        point_segment_distance(p, a, b)
    }

    /// Number of segments of this path crossed by the segment `from → to`,
    /// with path nodes on the line counted half-open (see `segment_crossing_number`).
    pub fn crossing_number(&self, from: Point, to: Point) -> usize {
        self.segments()
            .filter(|&(a, b)| crosses_half_open(from, to, a, b))
            .count()
    }

    /// Point-in-polygon by crossing-number parity; the ring is implicitly closed.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.nodes.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.nodes[i];
            let b = self.nodes[j];
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// First pair of non-adjacent segments `(i, j)`, `i < j`, that intersect.
    pub fn first_self_intersection(&self) -> Option<(usize, usize)> {
        let m = self.num_segments();
        for i in 0..m {
            for j in (i + 2)..m {
                if self.closed && i == 0 && j == m - 1 {
                    continue; // closing segment is adjacent to the first
                }
                let (a1, a2) = self.segment(i);
                let (b1, b2) = self.segment(j);
                if segment_intersection(a1, a2, b1, b2) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// True iff the node ring (as a closed polygon) has at least three nodes and
    /// no two non-adjacent edges intersect.
    pub fn is_simple_polygon(&self) -> bool {
        if self.nodes.len() < 3 {
            return false;
        }
        let ring = Self {
            nodes: self.nodes.clone(),
            closed: true,
        };
        ring.first_self_intersection().is_none()
    }

    /// True iff the boundaries of the two polygons intersect or one contains the other.
    pub fn overlaps_polygon(&self, other: &Path) -> bool {
        let a = self.as_ring();
        let b = other.as_ring();
        for (p1, p2) in a.segments() {
            for (q1, q2) in b.segments() {
                if segment_intersection(p1, p2, q1, q2) {
                    return true;
                }
            }
        }
        matches!(b.first(), Some(p) if a.contains(p)) || matches!(a.first(), Some(p) if b.contains(p))
    }

    fn as_ring(&self) -> std::borrow::Cow<'_, Path> {
        if self.closed {
            std::borrow::Cow::Borrowed(self)
        } else {
            std::borrow::Cow::Owned(Self::closed(self.nodes.clone()))
        }
    }

    /// Orthogonal projection on the nearest segment whose span contains it.
    ///
    /// Ties keep the first segment seen. `None` if no segment span admits a projection.
    pub fn project(&self, p: Point) -> Option<Projection> {
        let mut best: Option<(f64, Projection)> = None;
        for i in 0..self.num_segments() {
            let (a, b) = self.segment(i);
            if let Some((t, proj)) = project_on_line(p, a, b) {
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let d = distance(p, proj);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((
                        d,
                        Projection {
                            point: proj,
                            segment: i,
                        },
                    ));
                }
            }
        }
        best.map(|(_, pr)| pr)
    }

    /// Like [`Path::project`], but a point beyond the path's span is projected on
    /// the extension of the end segment nearer to it.
    pub fn project_or_extend(&self, p: Point) -> Option<Projection> {
        if let Some(pr) = self.project(p) {
            return Some(pr);
        }
        let m = self.num_segments();
        if m == 0 {
            return None;
        }
        let (first, last) = (self.first()?, self.last()?);
        let segment = if distance(p, first) <= distance(p, last) { 0 } else { m - 1 };
        let (a, b) = self.segment(segment);
        let (_, point) = project_on_line(p, a, b)?;
        Some(Projection { point, segment })
    }

    /// Length walked along the path between two projections: from the lower-index
    /// projection through the nodes between the two segments to the other one.
    pub fn walk_between(&self, a: Projection, b: Projection) -> f64 {
        let (start, end) = if a.segment <= b.segment { (a, b) } else { (b, a) };
        let mut len = 0.0;
        let mut prev = start.point;
        for k in (start.segment + 1)..=end.segment {
            let node = self.nodes[k % self.nodes.len()];
            len += distance(prev, node);
            prev = node;
        }
        len + distance(prev, end.point)
    }
}

fn normalize_nodes(mut nodes: Vec<Point>) -> Vec<Point> {
    nodes.dedup();
    if nodes.len() > 1 && nodes.first() == nodes.last() {
        nodes.pop();
    }
    nodes
}

/// Point-in-polygon test, see [`Path::contains`].
#[inline]
pub fn is_within_polygon(p: Point, polygon: &Path) -> bool {
    polygon.contains(p)
}

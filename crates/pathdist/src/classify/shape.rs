//! Path shape classification and curvature measures.
//!
//! The chord `L` joins the two end nodes of the path. How often `L` crosses the
//! path (ignoring the two end segments, which always touch it at the end nodes)
//! and on which side of the path `L`'s midpoint lies decide the shape.

use serde::{Deserialize, Serialize};

use crate::geom2::{distance, segment_crossing_number, Path};

use super::distance::perpend_dist;
use super::Polarity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    /// Chord entirely on the positive side.
    Convex,
    /// Chord entirely on the negative side.
    Concave,
    /// Chord entirely on one side, polarity undefined.
    ULike,
    /// Chord crosses the path an even number of times.
    WLike,
    /// Chord crosses the path an odd number of times.
    SLike,
    /// Chord (almost) collinear with the path.
    Flat,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Convex => "convex",
            Self::Concave => "concave",
            Self::ULike => "u-like",
            Self::WLike => "w-like",
            Self::SLike => "s-like",
            Self::Flat => "flat",
        }
    }

    /// Whether `curvature_centroid` is meaningful for this shape.
    #[inline]
    pub fn has_centroid_curvature(&self) -> bool {
        !matches!(self, Self::Flat | Self::WLike | Self::SLike)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ShapeReport {
    pub shape: Shape,
    /// Crossings of the chord with the path minus its end segments.
    pub chord_crossings: usize,
    /// Signed distance of the chord midpoint to the path; `None` when the
    /// midpoint's nearest segment is only reached off its span.
    pub chord_midpoint_dist: Option<f64>,
}

impl ShapeReport {
    /// Flat only because the chord midpoint lies exactly on the path or
    /// cannot be projected on it; the classification is ambiguous then.
    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        self.shape == Shape::Flat && self.chord_crossings == 0
    }
}

/// Classify the shape of `path`; `None` for paths with fewer than two nodes.
pub fn classify_shape(
    path: &Path,
    polarity: Option<Polarity>,
    flat_threshold: f64,
) -> Option<ShapeReport> {
    let nodes = path.nodes();
    if nodes.len() < 2 {
        return None;
    }
    let (first, last) = (nodes[0], nodes[nodes.len() - 1]);
    let inner: &[_] = if nodes.len() > 3 {
        &nodes[1..nodes.len() - 2]
    } else {
        &[]
    };
    let chord_crossings = segment_crossing_number(inner, first, last);
    let midpoint = (first + last) / 2.0;
    let chord_midpoint_dist = perpend_dist(midpoint, path, polarity, true);
    let shape = if chord_crossings == 0 {
        match chord_midpoint_dist {
            Some(d) if d < 0.0 => Shape::Concave,
            Some(d) if d > 0.0 && polarity.is_some() => Shape::Convex,
            Some(d) if d > 0.0 => Shape::ULike,
            _ => Shape::Flat,
        }
    } else if distance(first, last) / path.length() > flat_threshold {
        Shape::Flat
    } else if chord_crossings % 2 == 0 {
        Shape::WLike
    } else {
        Shape::SLike
    };
    Some(ShapeReport {
        shape,
        chord_crossings,
        chord_midpoint_dist,
    })
}

/// `1000 × signed distance of the path centroid to the path / path area`.
///
/// The sign follows the centroid's signed distance. `None` for flat,
/// w-like and s-like shapes, for a centroid that cannot be projected, and
/// for paths enclosing no area.
pub fn curvature_centroid(path: &Path, polarity: Option<Polarity>, shape: Shape) -> Option<f64> {
    if !shape.has_centroid_curvature() {
        return None;
    }
    let area = path.area();
    if area == 0.0 {
        return None;
    }
    let d = perpend_dist(path.centroid(), path, polarity, true)?;
    Some(1000.0 * d / area)
}

/// `1 - |chord| / length(path)`, in `[0, 1)`; lower is flatter.
pub fn curvature_dev_from_straight(path: &Path) -> Option<f64> {
    let (first, last) = (path.first()?, path.last()?);
    let len = path.length();
    if len == 0.0 {
        return None;
    }
    Some(1.0 - distance(first, last) / len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    #[test]
    fn straight_path_is_ambiguously_flat() {
        let p = Path::open(vec![vector![0.0, 0.0], vector![10.0, 0.0]]);
        let r = classify_shape(&p, None, 0.98).unwrap();
        assert_eq!(r.shape, Shape::Flat);
        assert!(r.is_ambiguous());
        assert!(curvature_centroid(&p, None, r.shape).is_none());
        assert!(curvature_dev_from_straight(&p).unwrap().abs() < 1e-12);
    }

    #[test]
    fn arch_shapes_by_polarity() {
        let arch = Path::open(vec![
            vector![0.0, 0.0],
            vector![0.0, 10.0],
            vector![10.0, 10.0],
            vector![10.0, 0.0],
        ]);
        let unsigned = classify_shape(&arch, None, 0.98).unwrap();
        assert_eq!(unsigned.shape, Shape::ULike);
        assert!(!unsigned.is_ambiguous());

        // chord midpoint (5, 0) lies on the same side as the reference point
        let inside = vector![5.0, 5.0];
        let convex = classify_shape(&arch, Some(Polarity::Positive(inside)), 0.98).unwrap();
        assert_eq!(convex.shape, Shape::Convex);
        let concave = classify_shape(&arch, Some(Polarity::Negative(inside)), 0.98).unwrap();
        assert_eq!(concave.shape, Shape::Concave);

        let c = curvature_centroid(&arch, Some(Polarity::Positive(inside)), convex.shape).unwrap();
        // centroid (5, 5) is 5 from the path, area 100
        assert!((c - 50.0).abs() < 1e-9);
        let dev = curvature_dev_from_straight(&arch).unwrap();
        assert!((dev - (1.0 - 10.0 / 30.0)).abs() < 1e-12);
    }

    #[test]
    fn crossing_chords() {
        // chord from (0,0) to (30,0) crosses the middle segment once
        let s = Path::open(vec![
            vector![0.0, 0.0],
            vector![5.0, 5.0],
            vector![10.0, 5.0],
            vector![20.0, -5.0],
            vector![25.0, -5.0],
            vector![30.0, 0.0],
        ]);
        let r = classify_shape(&s, None, 0.98).unwrap();
        assert_eq!(r.chord_crossings, 1);
        assert_eq!(r.shape, Shape::SLike);

        // a shallow zigzag whose chord is nearly as long as the path
        let z = Path::open(vec![
            vector![0.0, 0.0],
            vector![5.0, 0.1],
            vector![10.0, -0.1],
            vector![20.0, 0.1],
            vector![25.0, -0.1],
            vector![30.0, 0.0],
        ]);
        let r = classify_shape(&z, None, 0.98).unwrap();
        assert_eq!(r.shape, Shape::Flat);
        assert!(!r.is_ambiguous());

        let w = Path::open(vec![
            vector![0.0, 0.0],
            vector![5.0, 5.0],
            vector![10.0, -5.0],
            vector![20.0, 5.0],
            vector![25.0, -5.0],
            vector![30.0, 0.0],
        ]);
        let r = classify_shape(&w, None, 0.98).unwrap();
        assert_eq!(r.chord_crossings % 2, 0);
        assert!(r.chord_crossings > 0);
        assert_eq!(r.shape, Shape::WLike);
    }

    #[test]
    fn unprojectable_chord_midpoint_is_ambiguous() {
        // ends nearly meet; the midpoint (0.5, 0) is nearest to the last
        // segment's end node, off its span
        let hook = Path::open(vec![
            vector![0.0, 0.0],
            vector![0.0, 10.0],
            vector![10.0, 10.0],
            vector![10.0, 0.0],
            vector![1.0, 0.0],
        ]);
        let r = classify_shape(&hook, None, 0.98).unwrap();
        assert_eq!(r.chord_crossings, 0);
        assert_eq!(r.chord_midpoint_dist, None);
        assert_eq!(r.shape, Shape::Flat);
        assert!(r.is_ambiguous());
    }
}

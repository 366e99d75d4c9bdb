//! Point Classifier.
//!
//! Purpose
//! - Derive, per sample point, its relation to the profile path: hole
//!   membership, signed distance, shell membership, lateral position and
//!   association with the path.
//!
//! Pipeline (stops at the first discard)
//! 1. within a hole → discard
//! 2. perpendicular distance; unprojectable → discard
//! 3. outside the shell → discard
//! 4. lateral distance to the path center (absolute and normalized)
//! 5. association: unsigned distance ≤ spatial resolution, on or off segment
//!
//! Derived fields are explicit cache slots on `SpatialPoint`: filled by
//! `classify`, cleared by `invalidate`.

mod distance;
mod shape;

pub use distance::{lateral_dist, lateral_dist_between, perpend_dist};
pub use shape::{
    classify_shape, curvature_centroid, curvature_dev_from_straight, Shape, ShapeReport,
};

use serde::{Deserialize, Serialize};

use crate::geom2::{Path, Point};

/// Reference point deciding which side of the path has positive distances.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polarity {
    /// Points on this side of the path are positive.
    Positive(Point),
    /// Points on this side of the path are negative.
    Negative(Point),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointKind {
    Particle,
    Random,
    Grid,
    Simulated,
}

impl PointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Particle => "particle",
            Self::Random => "random point",
            Self::Grid => "grid point",
            Self::Simulated => "simulated point",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscardReason {
    WithinHole,
    UnableToProject,
    OutsideShell,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WithinHole => write!(f, "located within a hole"),
            Self::UnableToProject => write!(f, "unable to project on path"),
            Self::OutsideShell => write!(f, "located outside the shell"),
        }
    }
}

/// Everything a point is classified against, in pixel units.
#[derive(Clone, Copy, Debug)]
pub struct PathFrame<'a> {
    pub path: &'a Path,
    pub holes: &'a [Path],
    pub polarity: Option<Polarity>,
    pub shell_width: f64,
    pub spatial_resolution: f64,
}

impl PathFrame<'_> {
    #[inline]
    pub fn is_within_hole(&self, p: Point) -> bool {
        self.holes.iter().any(|h| h.contains(p))
    }

    /// Signed distance, `None` if the point cannot be projected on the path.
    #[inline]
    pub fn signed_dist(&self, p: Point) -> Option<f64> {
        perpend_dist(p, self.path, self.polarity, true)
    }
}

/// A classified sample point (particle, random, grid or simulated).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpatialPoint {
    pub point: Point,
    pub kind: PointKind,
    /// Signed perpendicular distance to the path (pixels).
    pub dist_to_path: Option<f64>,
    /// Distance along the path to its center point (pixels).
    pub lateral_dist_path: Option<f64>,
    /// `lateral_dist_path` over half the path length; > 1 beyond the path ends.
    pub norm_lateral_dist_path: Option<f64>,
    pub is_within_hole: Option<bool>,
    pub is_within_shell: Option<bool>,
    pub is_associated_with_path: Option<bool>,
    pub discard: Option<DiscardReason>,
    pub cluster_id: Option<usize>,
    #[serde(skip)]
    classified: bool,
}

impl SpatialPoint {
    pub fn new(point: Point, kind: PointKind) -> Self {
        Self {
            point,
            kind,
            dist_to_path: None,
            lateral_dist_path: None,
            norm_lateral_dist_path: None,
            is_within_hole: None,
            is_within_shell: None,
            is_associated_with_path: None,
            discard: None,
            cluster_id: None,
            classified: false,
        }
    }

    #[inline]
    pub fn is_classified(&self) -> bool {
        self.classified
    }

    #[inline]
    pub fn is_discarded(&self) -> bool {
        self.discard.is_some()
    }

    /// Clear every derived field.
    pub fn invalidate(&mut self) {
        *self = Self::new(self.point, self.kind);
    }

    /// Run the classification pipeline; returns the discard reason, if any.
    ///
    /// Cached: a second call without `invalidate` returns the stored outcome.
    pub fn classify(&mut self, frame: &PathFrame<'_>) -> Option<DiscardReason> {
        if self.classified {
            return self.discard;
        }
        self.classified = true;

        let within_hole = frame.is_within_hole(self.point);
        self.is_within_hole = Some(within_hole);
        if within_hole {
            return self.reject(DiscardReason::WithinHole);
        }

        self.dist_to_path = frame.signed_dist(self.point);
        let Some(d) = self.dist_to_path else {
            return self.reject(DiscardReason::UnableToProject);
        };

        let within_shell = d.abs() <= frame.shell_width;
        self.is_within_shell = Some(within_shell);
        if !within_shell {
            return self.reject(DiscardReason::OutsideShell);
        }

        self.lateral_dist_path = lateral_dist(self.point, frame.path);
        let half_length = frame.path.length() / 2.0;
        self.norm_lateral_dist_path = self.lateral_dist_path.map(|l| l / half_length);

        let assoc = perpend_dist(self.point, frame.path, None, false)
            .is_some_and(|u| u.abs() <= frame.spatial_resolution);
        self.is_associated_with_path = Some(assoc);
        None
    }

    fn reject(&mut self, reason: DiscardReason) -> Option<DiscardReason> {
        self.discard = Some(reason);
        Some(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn frame<'a>(path: &'a Path, holes: &'a [Path]) -> PathFrame<'a> {
        PathFrame {
            path,
            holes,
            polarity: None,
            shell_width: 5.0,
            spatial_resolution: 1.5,
        }
    }

    #[test]
    fn particle_near_straight_path() {
        let path = Path::open(vec![vector![0.0, 0.0], vector![10.0, 0.0]]);
        let f = frame(&path, &[]);
        let mut p = SpatialPoint::new(vector![5.0, 1.0], PointKind::Particle);
        assert_eq!(p.classify(&f), None);
        assert!(p.is_classified());
        assert_eq!(p.is_within_shell, Some(true));
        assert_eq!(p.is_within_hole, Some(false));
        assert!((p.dist_to_path.unwrap() - 1.0).abs() < 1e-12);
        assert!(p.lateral_dist_path.unwrap().abs() < 1e-12);
        assert_eq!(p.norm_lateral_dist_path, Some(0.0));
        assert_eq!(p.is_associated_with_path, Some(true));
    }

    #[test]
    fn discard_reasons() {
        let path = Path::open(vec![vector![0.0, 0.0], vector![10.0, 0.0]]);
        let holes = vec![Path::closed(vec![
            vector![1.0, 1.0],
            vector![3.0, 1.0],
            vector![3.0, 3.0],
            vector![1.0, 3.0],
        ])];
        let f = frame(&path, &holes);

        let mut in_hole = SpatialPoint::new(vector![2.0, 2.0], PointKind::Particle);
        assert_eq!(in_hole.classify(&f), Some(DiscardReason::WithinHole));
        assert!(in_hole.dist_to_path.is_none());

        let mut beyond = SpatialPoint::new(vector![20.0, 1.0], PointKind::Random);
        assert_eq!(beyond.classify(&f), Some(DiscardReason::UnableToProject));

        let mut far = SpatialPoint::new(vector![5.0, 8.0], PointKind::Grid);
        assert_eq!(far.classify(&f), Some(DiscardReason::OutsideShell));
        assert_eq!(far.is_within_shell, Some(false));
        assert!(far.is_discarded());
    }

    #[test]
    fn association_by_spatial_resolution() {
        let path = Path::open(vec![vector![0.0, 0.0], vector![10.0, 0.0]]);
        let f = frame(&path, &[]);
        let mut near = SpatialPoint::new(vector![8.0, 2.0], PointKind::Particle);
        near.classify(&f);
        assert_eq!(near.is_associated_with_path, Some(false));
        let mut close = SpatialPoint::new(vector![8.0, 1.0], PointKind::Particle);
        close.classify(&f);
        assert_eq!(close.is_associated_with_path, Some(true));
    }

    #[test]
    fn cache_and_invalidate() {
        let path = Path::open(vec![vector![0.0, 0.0], vector![10.0, 0.0]]);
        let f = frame(&path, &[]);
        let mut p = SpatialPoint::new(vector![5.0, 8.0], PointKind::Particle);
        assert_eq!(p.classify(&f), Some(DiscardReason::OutsideShell));
        let wider = PathFrame {
            shell_width: 10.0,
            ..f
        };
        // cached result until invalidated
        assert_eq!(p.classify(&wider), Some(DiscardReason::OutsideShell));
        p.invalidate();
        assert!(!p.is_classified());
        assert_eq!(p.classify(&wider), None);
    }
}

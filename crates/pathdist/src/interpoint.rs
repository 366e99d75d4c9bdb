//! Interpoint Distance Engine.
//!
//! Distances between two point sets (or within one), either straight-line
//! ("shortest") or along the path ("lateral"). In nearest-neighbour mode each
//! point of the first set gets the distance to its closest point in the second
//! set; a point is never its own neighbour. Pairs without a lateral distance
//! (no projection on the path) are dropped.

use serde::{Deserialize, Serialize};

use crate::cancel::{Aborted, CancelFlag};
use crate::classify::lateral_dist_between;
use crate::geom2::{distance, Path, Point};
use crate::options::InterpointOptions;

/// Ordered pair of point sets; the first is the one distances are reported for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    ParticleParticle,
    RandomParticle,
    ParticleSimulated,
    SimulatedParticle,
    SimulatedSimulated,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParticleParticle => "particle - particle",
            Self::RandomParticle => "random - particle",
            Self::ParticleSimulated => "particle - simulated",
            Self::SimulatedParticle => "simulated - particle",
            Self::SimulatedSimulated => "simulated - simulated",
        }
    }

    /// Both ends refer to the same set.
    #[inline]
    pub fn is_within_set(&self) -> bool {
        matches!(self, Self::ParticleParticle | Self::SimulatedSimulated)
    }

    /// Computed per Monte Carlo run rather than once per profile.
    #[inline]
    pub fn is_simulated(&self) -> bool {
        matches!(
            self,
            Self::ParticleSimulated | Self::SimulatedParticle | Self::SimulatedSimulated
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterpointMode {
    All,
    NearestNeighbour,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceKind {
    Shortest,
    Lateral,
}

impl DistanceKind {
    #[inline]
    fn measure(self, a: Point, b: Point, path: &Path) -> Option<f64> {
        match self {
            Self::Shortest => Some(distance(a, b)),
            Self::Lateral => lateral_dist_between(a, b, path),
        }
    }
}

/// Distances for one relation, in pixels.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InterpointDistances {
    pub relation: Relation,
    pub mode: InterpointMode,
    pub shortest: Vec<f64>,
    pub lateral: Vec<f64>,
}

/// Every unordered pair once within a set (`within_set`), else every pair of
/// `a × b`.
pub fn all_pairs(
    a: &[Point],
    b: &[Point],
    within_set: bool,
    kind: DistanceKind,
    path: &Path,
    cancel: &CancelFlag,
) -> Result<Vec<f64>, Aborted> {
    let mut out = Vec::new();
    for (i, &p) in a.iter().enumerate() {
        cancel.check()?;
        let start = if within_set { i + 1 } else { 0 };
        out.extend(b[start.min(b.len())..].iter().filter_map(|&q| kind.measure(p, q, path)));
    }
    Ok(out)
}

/// For each point of `a`, the smallest distance to a point of `b`; the first
/// minimum seen wins. With `within_set`, the point at the same index is skipped.
pub fn nearest_neighbours(
    a: &[Point],
    b: &[Point],
    within_set: bool,
    kind: DistanceKind,
    path: &Path,
    cancel: &CancelFlag,
) -> Result<Vec<f64>, Aborted> {
    let mut out = Vec::with_capacity(a.len());
    for (i, &p) in a.iter().enumerate() {
        cancel.check()?;
        let mut best: Option<f64> = None;
        for (j, &q) in b.iter().enumerate() {
            if within_set && i == j {
                continue;
            }
            if let Some(d) = kind.measure(p, q, path) {
                if best.map_or(true, |m| d < m) {
                    best = Some(d);
                }
            }
        }
        out.extend(best);
    }
    Ok(out)
}

/// Compute the distance kinds requested in `options` for `relation`.
///
/// For within-set relations pass the same slice as `from` and `to`.
pub fn interpoint_distances(
    relation: Relation,
    from: &[Point],
    to: &[Point],
    options: &InterpointOptions,
    path: &Path,
    cancel: &CancelFlag,
) -> Result<InterpointDistances, Aborted> {
    let within = relation.is_within_set();
    let run = |kind: DistanceKind| match options.mode {
        InterpointMode::All => all_pairs(from, to, within, kind, path, cancel),
        InterpointMode::NearestNeighbour => nearest_neighbours(from, to, within, kind, path, cancel),
    };
    let shortest = if options.shortest {
        run(DistanceKind::Shortest)?
    } else {
        Vec::new()
    };
    let lateral = if options.lateral {
        run(DistanceKind::Lateral)?
    } else {
        Vec::new()
    };
    Ok(InterpointDistances {
        relation,
        mode: options.mode,
        shortest,
        lateral,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn line() -> Path {
        Path::open(vec![vector![-16.0, 0.0], vector![16.0, 0.0]])
    }

    #[test]
    fn nearest_neighbour_on_a_line() {
        let pts = [vector![0.0, 0.0], vector![3.0, 0.0], vector![10.0, 0.0]];
        let cancel = CancelFlag::new();
        let nn = nearest_neighbours(&pts, &pts, true, DistanceKind::Shortest, &line(), &cancel)
            .unwrap();
        assert_eq!(nn, vec![3.0, 3.0, 7.0]);
        let lat = nearest_neighbours(&pts, &pts, true, DistanceKind::Lateral, &line(), &cancel)
            .unwrap();
        assert_eq!(lat, vec![3.0, 3.0, 7.0]);
    }

    #[test]
    fn all_pairs_within_and_between() {
        let pts = [vector![0.0, 0.0], vector![3.0, 0.0], vector![10.0, 0.0]];
        let cancel = CancelFlag::new();
        let within = all_pairs(&pts, &pts, true, DistanceKind::Shortest, &line(), &cancel).unwrap();
        assert_eq!(within, vec![3.0, 10.0, 7.0]);
        let other = [vector![0.0, 4.0]];
        let between = all_pairs(&other, &pts, false, DistanceKind::Shortest, &line(), &cancel)
            .unwrap();
        assert_eq!(between.len(), 3);
        assert_eq!(between[0], 4.0);
        assert_eq!(between[1], 5.0);
    }

    #[test]
    fn unprojectable_pairs_dropped() {
        let pts = [vector![0.0, 1.0], vector![5.0, 1.0], vector![50.0, 1.0]];
        let cancel = CancelFlag::new();
        let lat = all_pairs(&pts, &pts, true, DistanceKind::Lateral, &line(), &cancel).unwrap();
        assert_eq!(lat, vec![5.0]);
        // (50, 1) lies beyond the path and has no lateral neighbour
        let nn = nearest_neighbours(&pts, &pts, true, DistanceKind::Lateral, &line(), &cancel)
            .unwrap();
        assert_eq!(nn, vec![5.0, 5.0]);
    }

    #[test]
    fn options_select_kinds() {
        let pts = [vector![0.0, 0.0], vector![3.0, 0.0]];
        let opt = InterpointOptions {
            enabled: true,
            mode: InterpointMode::All,
            shortest: true,
            lateral: false,
            relations: vec![Relation::ParticleParticle],
        };
        let r = interpoint_distances(
            Relation::ParticleParticle,
            &pts,
            &pts,
            &opt,
            &line(),
            &CancelFlag::new(),
        )
        .unwrap();
        assert_eq!(r.shortest, vec![3.0]);
        assert!(r.lateral.is_empty());
        assert_eq!(r.mode, InterpointMode::All);
    }

    #[test]
    fn single_point_has_no_neighbour() {
        let pts = [vector![1.0, 0.0]];
        let nn = nearest_neighbours(
            &pts,
            &pts,
            true,
            DistanceKind::Shortest,
            &line(),
            &CancelFlag::new(),
        )
        .unwrap();
        assert!(nn.is_empty());
    }

    #[test]
    fn relation_serde_names() {
        let s = serde_json::to_string(&Relation::RandomParticle).unwrap();
        assert_eq!(s, "\"random-particle\"");
        assert!(Relation::SimulatedSimulated.is_within_set());
        assert!(!Relation::RandomParticle.is_simulated());
    }
}

//! Monte Carlo Engine.
//!
//! Purpose
//! - Build a null model for the particle distribution: per run, place as many
//!   uniformly random points as there are particles in the simulation window,
//!   subject to the same geometric constraints as the particles.
//!
//! Model
//! - Draws are uniform in the path's bounding box expanded by the shell width
//!   and rejected until the point classifies without discard, lies in the
//!   window and does not repeat a point already placed in the run.
//! - Run `i` draws from `ReplayToken { seed, index: i }`; runs share nothing.
//! - A run that rejects `max_attempts_per_point` draws in a row gives up
//!   (`SamplingExhausted`); completed runs are kept.

mod sampler;

pub use sampler::{draw_in_box, ReplayToken};

use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::classify::{PathFrame, PointKind, SpatialPoint};
use crate::cluster::{cluster_points, Cluster};
use crate::error::{ProfileError, ProfileResult};
use crate::geom2::Point;
use crate::interpoint::{interpoint_distances, InterpointDistances, Relation};
use crate::options::InterpointOptions;

/// Region of the shell simulated points are placed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationWindow {
    Shell,
    PositiveShell,
    NegativeShell,
}

impl SimulationWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::PositiveShell => "positive shell",
            Self::NegativeShell => "negative shell",
        }
    }

    /// Whether a point at signed distance `d` (already within the shell) lies
    /// in the window. Points on the path belong to both half shells.
    #[inline]
    pub fn admits(&self, d: f64) -> bool {
        match self {
            Self::Shell => true,
            Self::PositiveShell => d >= 0.0,
            Self::NegativeShell => d <= 0.0,
        }
    }

    /// Half-shell windows are only meaningful for signed distances.
    #[inline]
    pub fn needs_polarity(&self) -> bool {
        !matches!(self, Self::Shell)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonteCarloRun {
    pub token: ReplayToken,
    pub points: Vec<SpatialPoint>,
    pub interpoint: Vec<InterpointDistances>,
    pub clusters: Vec<Cluster>,
}

/// One profile's simulation setup, in pixel units.
#[derive(Clone, Copy, Debug)]
pub struct Simulation<'a> {
    pub frame: PathFrame<'a>,
    /// Classified particles that survived filtering.
    pub particles: &'a [SpatialPoint],
    pub window: SimulationWindow,
    pub max_attempts_per_point: usize,
    /// Relations with a simulated end are computed per run.
    pub interpoint: Option<&'a InterpointOptions>,
    /// Cluster threshold for the simulated points; `None` skips clustering.
    pub within_cluster_dist: Option<f64>,
}

impl Simulation<'_> {
    /// Particles inside the simulation window.
    pub fn target_count(&self) -> usize {
        self.particles
            .iter()
            .filter(|p| p.dist_to_path.is_some_and(|d| self.window.admits(d)))
            .count()
    }

    /// Place the simulated points of one run.
    pub fn sample(&self, token: ReplayToken, cancel: &CancelFlag) -> ProfileResult<Vec<SpatialPoint>> {
        let target = self.target_count();
        let mut points: Vec<SpatialPoint> = Vec::with_capacity(target);
        let Some(bbox) = self.frame.path.bounding_box() else {
            return Ok(points);
        };
        let bbox = bbox.expand(self.frame.shell_width);
        let mut rng = token.to_std_rng();
        let mut attempts = 0;
        while points.len() < target {
            cancel.check()?;
            if attempts >= self.max_attempts_per_point {
                return Err(ProfileError::SamplingExhausted {
                    run: token.index as usize,
                    placed: points.len(),
                    target,
                    attempts,
                });
            }
            attempts += 1;
            let p = draw_in_box(&mut rng, &bbox);
            if points.iter().any(|q| q.point == p) {
                continue;
            }
            let mut sp = SpatialPoint::new(p, PointKind::Simulated);
            if sp.classify(&self.frame).is_some() {
                continue;
            }
            if !sp.dist_to_path.is_some_and(|d| self.window.admits(d)) {
                continue;
            }
            points.push(sp);
            attempts = 0;
        }
        Ok(points)
    }

    /// Sample one run and compute its interpoint distances and clusters.
    pub fn run(&self, token: ReplayToken, cancel: &CancelFlag) -> ProfileResult<MonteCarloRun> {
        let mut points = self.sample(token, cancel)?;
        let mut interpoint = Vec::new();
        if let Some(opt) = self.interpoint.filter(|o| o.enabled) {
            let sim: Vec<Point> = points.iter().map(|p| p.point).collect();
            let real: Vec<Point> = self.particles.iter().map(|p| p.point).collect();
            for &relation in opt.relations.iter().filter(|r| r.is_simulated()) {
                let (from, to) = match relation {
                    Relation::ParticleSimulated => (&real, &sim),
                    Relation::SimulatedParticle => (&sim, &real),
                    _ => (&sim, &sim),
                };
                interpoint.push(interpoint_distances(
                    relation,
                    from,
                    to,
                    opt,
                    self.frame.path,
                    cancel,
                )?);
            }
        }
        let clusters = match self.within_cluster_dist {
            Some(d) => cluster_points(&mut points, d, &self.frame, cancel)?,
            None => Vec::new(),
        };
        Ok(MonteCarloRun {
            token,
            points,
            interpoint,
            clusters,
        })
    }
}

/// Run `runs` independent simulations, pushing each completed run to `out`.
///
/// On error the runs completed so far stay in `out`.
pub fn run_monte_carlo(
    sim: &Simulation<'_>,
    runs: usize,
    seed: u64,
    cancel: &CancelFlag,
    out: &mut Vec<MonteCarloRun>,
) -> ProfileResult<()> {
    for index in 0..runs {
        cancel.check()?;
        let run = sim.run(
            ReplayToken {
                seed,
                index: index as u64,
            },
            cancel,
        )?;
        tracing::debug!(run = index, points = run.points.len(), "monte carlo run done");
        out.push(run);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Polarity;
    use crate::geom2::Path;
    use nalgebra::vector;
    use proptest::prelude::*;

    fn path() -> Path {
        Path::open(vec![vector![0.0, 0.0], vector![50.0, 0.0], vector![100.0, 20.0]])
    }

    fn holes() -> Vec<Path> {
        vec![Path::closed(vec![
            vector![20.0, 2.0],
            vector![30.0, 2.0],
            vector![30.0, 8.0],
            vector![20.0, 8.0],
        ])]
    }

    fn particles(frame: &PathFrame<'_>, coords: &[(f64, f64)]) -> Vec<SpatialPoint> {
        coords
            .iter()
            .map(|&(x, y)| {
                let mut p = SpatialPoint::new(vector![x, y], PointKind::Particle);
                p.classify(frame);
                p
            })
            .filter(|p| !p.is_discarded())
            .collect()
    }

    fn simulation<'a>(frame: PathFrame<'a>, particles: &'a [SpatialPoint]) -> Simulation<'a> {
        Simulation {
            frame,
            particles,
            window: SimulationWindow::Shell,
            max_attempts_per_point: 10_000,
            interpoint: None,
            within_cluster_dist: None,
        }
    }

    #[test]
    fn no_particles_no_points() {
        let (path, holes) = (path(), holes());
        let frame = PathFrame {
            path: &path,
            holes: &holes,
            polarity: None,
            shell_width: 10.0,
            spatial_resolution: 1.0,
        };
        let sim = simulation(frame, &[]);
        let mut out = Vec::new();
        run_monte_carlo(&sim, 5, 1, &CancelFlag::new(), &mut out).unwrap();
        assert_eq!(out.len(), 5);
        assert!(out.iter().all(|r| r.points.is_empty()));
    }

    #[test]
    fn runs_are_reproducible() {
        let (path, holes) = (path(), holes());
        let frame = PathFrame {
            path: &path,
            holes: &holes,
            polarity: None,
            shell_width: 10.0,
            spatial_resolution: 1.0,
        };
        let ps = particles(&frame, &[(10.0, 1.0), (40.0, -3.0), (70.0, 12.0)]);
        assert_eq!(ps.len(), 3);
        let sim = simulation(frame, &ps);
        let cancel = CancelFlag::new();
        let a = sim.run(ReplayToken { seed: 9, index: 0 }, &cancel).unwrap();
        let b = sim.run(ReplayToken { seed: 9, index: 0 }, &cancel).unwrap();
        let c = sim.run(ReplayToken { seed: 9, index: 1 }, &cancel).unwrap();
        assert_eq!(a.points.len(), 3);
        assert_eq!(a, b);
        assert_ne!(a.points, c.points);
    }

    #[test]
    fn half_shell_window() {
        let path = Path::open(vec![vector![0.0, 0.0], vector![100.0, 0.0]]);
        let frame = PathFrame {
            path: &path,
            holes: &[],
            polarity: Some(Polarity::Positive(vector![50.0, 50.0])),
            shell_width: 10.0,
            spatial_resolution: 1.0,
        };
        let ps = particles(&frame, &[(10.0, 1.0), (20.0, 2.0), (30.0, -2.0)]);
        let sim = Simulation {
            window: SimulationWindow::PositiveShell,
            ..simulation(frame, &ps)
        };
        assert_eq!(sim.target_count(), 2);
        let run = sim.run(ReplayToken { seed: 3, index: 0 }, &CancelFlag::new()).unwrap();
        assert_eq!(run.points.len(), 2);
        assert!(run.points.iter().all(|p| p.point.y >= 0.0));
    }

    #[test]
    fn per_run_interpoint_and_clusters() {
        let path = Path::open(vec![vector![0.0, 0.0], vector![100.0, 0.0]]);
        let frame = PathFrame {
            path: &path,
            holes: &[],
            polarity: None,
            shell_width: 10.0,
            spatial_resolution: 1.0,
        };
        let ps = particles(&frame, &[(10.0, 1.0), (20.0, 2.0), (30.0, -2.0)]);
        let opt = InterpointOptions {
            enabled: true,
            relations: vec![
                Relation::ParticleParticle,
                Relation::SimulatedSimulated,
                Relation::ParticleSimulated,
            ],
            ..InterpointOptions::default()
        };
        let sim = Simulation {
            interpoint: Some(&opt),
            within_cluster_dist: Some(5.0),
            ..simulation(frame, &ps)
        };
        let run = sim.run(ReplayToken { seed: 5, index: 2 }, &CancelFlag::new()).unwrap();
        let rels: Vec<Relation> = run.interpoint.iter().map(|d| d.relation).collect();
        assert_eq!(rels, vec![Relation::SimulatedSimulated, Relation::ParticleSimulated]);
        // nearest neighbour: one value per particle
        assert_eq!(run.interpoint[1].shortest.len(), 3);
        assert!(!run.clusters.is_empty());
        assert!(run.points.iter().all(|p| p.cluster_id.is_some()));
    }

    #[test]
    fn unreachable_window_gives_up() {
        // zero shell width: only points exactly on the path would do
        let path = Path::open(vec![vector![0.0, 0.0], vector![10.0, 0.0], vector![10.0, 10.0]]);
        let frame = PathFrame {
            path: &path,
            holes: &[],
            polarity: None,
            shell_width: 0.0,
            spatial_resolution: 1.0,
        };
        let ps = particles(&frame, &[(5.0, 0.0)]);
        assert_eq!(ps.len(), 1);
        let sim = Simulation {
            max_attempts_per_point: 50,
            ..simulation(frame, &ps)
        };
        let mut out = Vec::new();
        let err = run_monte_carlo(&sim, 3, 0, &CancelFlag::new(), &mut out).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::SamplingExhausted {
                run: 0,
                placed: 0,
                target: 1,
                attempts: 50
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn cancel_stops_runs() {
        let (path, holes) = (path(), holes());
        let frame = PathFrame {
            path: &path,
            holes: &holes,
            polarity: None,
            shell_width: 10.0,
            spatial_resolution: 1.0,
        };
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut out = Vec::new();
        let err = run_monte_carlo(&simulation(frame, &[]), 3, 0, &cancel, &mut out).unwrap_err();
        assert!(err.is_aborted());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn simulated_points_stay_in_shell_and_out_of_holes(seed in any::<u64>(), runs in 1usize..4) {
            let (path, holes) = (path(), holes());
            let frame = PathFrame {
                path: &path,
                holes: &holes,
                polarity: None,
                shell_width: 10.0,
                spatial_resolution: 1.0,
            };
            let ps = particles(&frame, &[(10.0, 1.0), (40.0, -3.0), (70.0, 12.0), (90.0, 14.0)]);
            let sim = simulation(frame, &ps);
            let mut out = Vec::new();
            run_monte_carlo(&sim, runs, seed, &CancelFlag::new(), &mut out).unwrap();
            prop_assert_eq!(out.len(), runs);
            for run in &out {
                prop_assert_eq!(run.points.len(), ps.len());
                for p in &run.points {
                    let d = p.dist_to_path.unwrap();
                    prop_assert!(d.abs() <= 10.0);
                    prop_assert!(!frame.is_within_hole(p.point));
                    prop_assert_eq!(p.discard, None);
                }
            }
        }
    }
}

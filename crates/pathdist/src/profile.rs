//! Profile Orchestrator.
//!
//! Purpose
//! - Run one profile through the pipeline and collect its results, then do the
//!   same for a batch of profiles.
//!
//! Pipeline
//! - validate path and holes → classify and filter each point set →
//!   interpoint distances → particle clusters → Monte Carlo runs.
//! - Geometry, input and option errors fail only the profile (`Failed`); the
//!   batch goes on. Cancellation stops the batch and the current profile is
//!   dropped from it.
//! - Discarded particles, an ambiguous shape and a stopped simulation are
//!   warnings: logged, collected on the profile, never fatal.
//!
//! Units
//! - Everything is computed in pixels; `Options` and `ProfileSummary` use the
//!   profile's metric unit.

use serde::Serialize;

use crate::cancel::CancelFlag;
use crate::classify::{
    classify_shape, curvature_centroid, curvature_dev_from_straight, DiscardReason, PathFrame,
    PointKind, Polarity, Shape, ShapeReport, SpatialPoint,
};
use crate::cluster::{cluster_points, Cluster};
use crate::error::{ProfileError, ProfileResult};
use crate::geom2::{to_metric_units, to_pixel_units, Path, Point};
use crate::interpoint::{interpoint_distances, InterpointDistances, Relation};
use crate::montecarlo::{run_monte_carlo, MonteCarloRun, Simulation, SimulationWindow};
use crate::options::{BatchContext, Options};
use crate::validate::{validate_holes, validate_path};

/// Raw data of one profile, as delivered by a parser.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileInput {
    pub id: String,
    pub comment: String,
    pub src_img: String,
    /// Where the profile came from (file name); used to label it in reports.
    pub input_file: String,
    pub path: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
    pub particles: Vec<Point>,
    pub random_points: Vec<Point>,
    pub grid_points: Vec<Point>,
    /// Metric length of one pixel.
    pub pixel_width: f64,
    pub metric_unit: String,
    pub polarity: Option<Polarity>,
    /// Non-fatal remarks from parsing.
    pub warnings: Vec<String>,
}

impl ProfileInput {
    pub fn new(path: Vec<Point>, pixel_width: f64, metric_unit: impl Into<String>) -> Self {
        Self {
            id: "N/A".to_string(),
            comment: String::new(),
            src_img: "N/A".to_string(),
            input_file: String::new(),
            path,
            holes: Vec::new(),
            particles: Vec::new(),
            random_points: Vec::new(),
            grid_points: Vec::new(),
            pixel_width,
            metric_unit: metric_unit.into(),
            polarity: None,
            warnings: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "kebab-case")]
pub enum ProfileStatus {
    Pending,
    Processed,
    Failed(String),
    Aborted,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileWarning {
    /// Remark passed on from the parser.
    Input(String),
    Discarded {
        kind: PointKind,
        /// One-based position in the input.
        number: usize,
        point: Point,
        reason: DiscardReason,
    },
    /// The end chord's midpoint lies on the path; shape reported as flat.
    AmbiguousShape,
    MonteCarloStopped { completed: usize, reason: String },
}

impl std::fmt::Display for ProfileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(msg) => write!(f, "{msg}"),
            Self::Discarded {
                kind,
                number,
                point,
                reason,
            } => write!(
                f,
                "{} {} at ({}, {}) {}: skipped",
                kind.as_str(),
                number,
                point.x,
                point.y,
                reason
            ),
            Self::AmbiguousShape => write!(
                f,
                "midpoint of the line between the path end nodes lies on the path; shape classified as flat"
            ),
            Self::MonteCarloStopped { completed, reason } => write!(
                f,
                "Monte Carlo simulation stopped after {completed} completed runs: {reason}"
            ),
        }
    }
}

/// Number of discarded points per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiscardCounts {
    pub particle: usize,
    pub random: usize,
    pub grid: usize,
}

impl DiscardCounts {
    pub fn get(&self, kind: PointKind) -> usize {
        match kind {
            PointKind::Particle => self.particle,
            PointKind::Random => self.random,
            PointKind::Grid => self.grid,
            PointKind::Simulated => 0,
        }
    }

    fn add(&mut self, kind: PointKind) {
        match kind {
            PointKind::Particle => self.particle += 1,
            PointKind::Random => self.random += 1,
            PointKind::Grid => self.grid += 1,
            PointKind::Simulated => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Profile {
    pub id: String,
    pub comment: String,
    pub src_img: String,
    pub input_file: String,
    pub pixel_width: f64,
    pub metric_unit: String,
    pub polarity: Option<Polarity>,
    pub path: Path,
    pub holes: Vec<Path>,
    /// Point sets; discarded points are removed during processing.
    pub particles: Vec<SpatialPoint>,
    pub random_points: Vec<SpatialPoint>,
    pub grid_points: Vec<SpatialPoint>,
    pub discarded: DiscardCounts,
    pub shape: Option<ShapeReport>,
    pub curvature_centroid: Option<f64>,
    pub curvature_dev_from_straight: Option<f64>,
    pub interpoint: Vec<InterpointDistances>,
    pub clusters: Vec<Cluster>,
    pub monte_carlo: Vec<MonteCarloRun>,
    pub warnings: Vec<ProfileWarning>,
    pub status: ProfileStatus,
}

fn spatial_points(points: Vec<Point>, kind: PointKind) -> Vec<SpatialPoint> {
    points.into_iter().map(|p| SpatialPoint::new(p, kind)).collect()
}

fn is_positive(p: &SpatialPoint) -> bool {
    p.dist_to_path.is_some_and(|d| d >= 0.0)
}

fn is_in_shell(p: &SpatialPoint) -> bool {
    p.is_within_shell == Some(true)
}

fn is_associated(p: &SpatialPoint) -> bool {
    p.is_associated_with_path == Some(true)
}

#[inline]
fn is_finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Reject NaN or infinite coordinates in a point set.
fn check_finite(points: &[SpatialPoint]) -> ProfileResult<()> {
    match points.iter().enumerate().find(|(_, p)| !is_finite(p.point)) {
        Some((i, p)) => Err(ProfileError::InvalidInput(format!(
            "{} {} has a non-finite coordinate",
            p.kind.as_str(),
            i + 1
        ))),
        None => Ok(()),
    }
}

fn push_warning(warnings: &mut Vec<ProfileWarning>, warning: ProfileWarning) {
    tracing::warn!("{warning}");
    warnings.push(warning);
}

/// Classify every point of `points` and drop the discarded ones.
fn classify_set(
    points: &mut Vec<SpatialPoint>,
    frame: &PathFrame<'_>,
    discarded: &mut DiscardCounts,
    warnings: &mut Vec<ProfileWarning>,
    cancel: &CancelFlag,
) -> ProfileResult<()> {
    for (i, p) in points.iter_mut().enumerate() {
        cancel.check()?;
        let Some(reason) = p.classify(frame) else {
            continue;
        };
        discarded.add(p.kind);
        if p.kind == PointKind::Particle {
            push_warning(
                warnings,
                ProfileWarning::Discarded {
                    kind: p.kind,
                    number: i + 1,
                    point: p.point,
                    reason,
                },
            );
        }
    }
    points.retain(|p| !p.is_discarded());
    Ok(())
}

impl Profile {
    pub fn new(input: ProfileInput) -> Self {
        Self {
            id: input.id,
            comment: input.comment,
            src_img: input.src_img,
            input_file: input.input_file,
            pixel_width: input.pixel_width,
            metric_unit: input.metric_unit,
            polarity: input.polarity,
            path: Path::open(input.path),
            holes: input.holes.into_iter().map(Path::closed).collect(),
            particles: spatial_points(input.particles, PointKind::Particle),
            random_points: spatial_points(input.random_points, PointKind::Random),
            grid_points: spatial_points(input.grid_points, PointKind::Grid),
            discarded: DiscardCounts::default(),
            shape: None,
            curvature_centroid: None,
            curvature_dev_from_straight: None,
            interpoint: Vec::new(),
            clusters: Vec::new(),
            monte_carlo: Vec::new(),
            warnings: input.warnings.into_iter().map(ProfileWarning::Input).collect(),
            status: ProfileStatus::Pending,
        }
    }

    /// Input file if known, else the profile id.
    pub fn label(&self) -> &str {
        if self.input_file.is_empty() {
            &self.id
        } else {
            &self.input_file
        }
    }

    #[inline]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Pixels to the profile's metric unit.
    #[inline]
    pub fn metric(&self, px: f64) -> f64 {
        to_metric_units(px, self.pixel_width)
    }

    /// Run the pipeline once and record the outcome in `status`.
    pub fn process(&mut self, options: &Options, ctx: &mut BatchContext) -> ProfileResult<()> {
        let span = tracing::info_span!("profile", id = %self.id, file = %self.input_file);
        let _enter = span.enter();
        match self.run(options, ctx) {
            Ok(()) => {
                tracing::info!(
                    particles = self.particles.len(),
                    discarded = self.discarded.particle,
                    warnings = self.warnings.len(),
                    "processed"
                );
                self.status = ProfileStatus::Processed;
                Ok(())
            }
            Err(e) if e.is_aborted() => {
                tracing::warn!("aborted");
                self.status = ProfileStatus::Aborted;
                Err(e)
            }
            Err(e) => {
                tracing::error!(error = %e, "not processed");
                self.status = ProfileStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn run(&mut self, options: &Options, ctx: &mut BatchContext) -> ProfileResult<()> {
        ctx.cancel.check()?;
        options.validate()?;
        let pw = self.pixel_width;
        if !(pw.is_finite() && pw > 0.0) {
            return Err(ProfileError::InvalidInput(format!(
                "pixel width {pw} is not a positive number"
            )));
        }
        if let Some(Polarity::Positive(r) | Polarity::Negative(r)) = self.polarity {
            if !is_finite(r) {
                return Err(ProfileError::InvalidInput(
                    "polarity reference point has a non-finite coordinate".to_string(),
                ));
            }
        }
        for set in [&self.particles, &self.random_points, &self.grid_points] {
            check_finite(set)?;
        }
        ctx.register_polarity(&self.id, self.polarity.is_some())?;
        let mc = &options.monte_carlo;
        if mc.enabled && mc.window.needs_polarity() && self.polarity.is_none() {
            return Err(ProfileError::InvalidOptions(format!(
                "simulation window '{}' requires a defined polarity",
                mc.window.as_str()
            )));
        }
        validate_path(&self.path)?;
        validate_holes(&self.holes)?;
        tracing::debug!(nodes = self.path.len(), holes = self.holes.len(), "geometry valid");

        let frame = PathFrame {
            path: &self.path,
            holes: &self.holes,
            polarity: self.polarity,
            shell_width: to_pixel_units(options.shell_width, pw),
            spatial_resolution: to_pixel_units(options.spatial_resolution, pw),
        };

        self.shape = classify_shape(&self.path, self.polarity, options.flat_threshold);
        if let Some(report) = self.shape {
            if report.is_ambiguous() {
                push_warning(&mut self.warnings, ProfileWarning::AmbiguousShape);
            }
            self.curvature_centroid = curvature_centroid(&self.path, self.polarity, report.shape);
        }
        self.curvature_dev_from_straight = curvature_dev_from_straight(&self.path);

        for set in [
            &mut self.particles,
            &mut self.random_points,
            &mut self.grid_points,
        ] {
            classify_set(set, &frame, &mut self.discarded, &mut self.warnings, &ctx.cancel)?;
        }
        tracing::debug!(
            particles = self.particles.len(),
            random = self.random_points.len(),
            grid = self.grid_points.len(),
            discarded = ?self.discarded,
            "points classified"
        );

        let ip = &options.interpoint;
        if ip.enabled {
            let particles: Vec<Point> = self.particles.iter().map(|p| p.point).collect();
            let random: Vec<Point> = self.random_points.iter().map(|p| p.point).collect();
            for &relation in ip.relations.iter().filter(|r| !r.is_simulated()) {
                let from = match relation {
                    Relation::RandomParticle => &random,
                    _ => &particles,
                };
                self.interpoint.push(interpoint_distances(
                    relation,
                    from,
                    &particles,
                    ip,
                    &self.path,
                    &ctx.cancel,
                )?);
            }
        }

        let cluster_dist = options
            .clustering
            .enabled
            .then(|| to_pixel_units(options.clustering.within_cluster_dist, pw));
        if let Some(d) = cluster_dist {
            self.clusters = cluster_points(&mut self.particles, d, &frame, &ctx.cancel)?;
            tracing::debug!(clusters = self.clusters.len(), "particles clustered");
        }

        if mc.enabled {
            let seed = mc.seed.unwrap_or_else(rand::random);
            let sim = Simulation {
                frame,
                particles: &self.particles,
                window: mc.window,
                max_attempts_per_point: mc.max_attempts_per_point,
                interpoint: ip.enabled.then_some(ip),
                within_cluster_dist: cluster_dist,
            };
            tracing::info!(runs = mc.runs, seed, target = sim.target_count(), "monte carlo");
            let mut runs = Vec::with_capacity(mc.runs);
            let outcome = run_monte_carlo(&sim, mc.runs, seed, &ctx.cancel, &mut runs);
            self.monte_carlo = runs;
            match outcome {
                Ok(()) => {}
                Err(e) if e.is_aborted() => return Err(e),
                Err(e) => push_warning(
                    &mut self.warnings,
                    ProfileWarning::MonteCarloStopped {
                        completed: self.monte_carlo.len(),
                        reason: e.to_string(),
                    },
                ),
            }
        }
        Ok(())
    }

    /// Per-profile statistics in metric units.
    pub fn summary(&self) -> ProfileSummary {
        let count =
            |f: fn(&SpatialPoint) -> bool| self.particles.iter().filter(|p| f(p)).count();
        ProfileSummary {
            id: self.id.clone(),
            input_file: self.input_file.clone(),
            comment: self.comment.clone(),
            path_length: self.metric(self.path.length()),
            particles: self.particles.len(),
            positive_particles: count(is_positive),
            positive_shell_particles: count(|p| is_in_shell(p) && is_positive(p)),
            negative_shell_particles: count(|p| is_in_shell(p) && !is_positive(p)),
            shell_positive_or_associated: count(|p| {
                (is_in_shell(p) && is_positive(p)) || is_associated(p)
            }),
            associated_particles: count(is_associated),
            discarded_particles: self.discarded.particle,
            shape: self.shape.map(|r| r.shape),
            curvature_centroid: self.curvature_centroid.map(|c| c / self.pixel_width),
            curvature_dev_from_straight: self.curvature_dev_from_straight,
        }
    }
}

/// Profile statistics; lengths in the profile's metric unit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub id: String,
    pub input_file: String,
    pub comment: String,
    pub path_length: f64,
    pub particles: usize,
    pub positive_particles: usize,
    pub positive_shell_particles: usize,
    pub negative_shell_particles: usize,
    /// Shell particles on the positive side, or associated with the path.
    pub shell_positive_or_associated: usize,
    pub associated_particles: usize,
    pub discarded_particles: usize,
    pub shape: Option<Shape>,
    /// Per metric unit.
    pub curvature_centroid: Option<f64>,
    pub curvature_dev_from_straight: Option<f64>,
}

/// Profiles of one batch in input order. An aborted batch omits the profile
/// that was being processed and everything after it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Batch {
    pub profiles: Vec<Profile>,
    pub aborted: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedProfile {
    pub profile: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SessionSummary {
    pub processed: usize,
    pub failed: Vec<FailedProfile>,
    pub clean: Vec<String>,
    pub with_warnings: Vec<String>,
    pub without_particles: Vec<String>,
    pub aborted: bool,
}

impl Batch {
    /// Successfully processed profiles.
    pub fn processed(&self) -> impl Iterator<Item = &Profile> {
        self.profiles
            .iter()
            .filter(|p| p.status == ProfileStatus::Processed)
    }

    pub fn session_summary(&self) -> SessionSummary {
        let mut s = SessionSummary {
            aborted: self.aborted,
            ..SessionSummary::default()
        };
        for p in &self.profiles {
            let label = p.label().to_string();
            match &p.status {
                ProfileStatus::Failed(error) => s.failed.push(FailedProfile {
                    profile: label,
                    error: error.clone(),
                }),
                ProfileStatus::Processed => {
                    s.processed += 1;
                    if p.particles.is_empty() {
                        s.without_particles.push(label.clone());
                    }
                    if p.has_warnings() {
                        s.with_warnings.push(label);
                    } else {
                        s.clean.push(label);
                    }
                }
                ProfileStatus::Pending | ProfileStatus::Aborted => {}
            }
        }
        s
    }
}

/// Process profiles in order until done or cancelled.
pub fn process_batch<I>(inputs: I, options: &Options, ctx: &mut BatchContext) -> Batch
where
    I: IntoIterator<Item = ProfileInput>,
{
    let mc = &options.monte_carlo;
    if mc.enabled
        && mc.window != SimulationWindow::Shell
        && options.interpoint.enabled
        && options.interpoint.relations.iter().any(Relation::is_simulated)
    {
        tracing::warn!(
            window = mc.window.as_str(),
            "particle - simulated distances include particles outside the simulation window"
        );
    }
    let mut batch = Batch::default();
    for input in inputs {
        if ctx.cancel.is_cancelled() {
            batch.aborted = true;
            break;
        }
        let mut profile = Profile::new(input);
        match profile.process(options, ctx) {
            Err(e) if e.is_aborted() => {
                batch.aborted = true;
                break;
            }
            _ => batch.profiles.push(profile),
        }
    }
    tracing::info!(
        profiles = batch.profiles.len(),
        aborted = batch.aborted,
        "batch done"
    );
    batch
}

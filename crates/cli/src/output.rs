//! Report files for a processed batch.
//!
//! One CSV per table, one row per item, all profiles of the batch stacked.
//! Distances are in each profile's metric unit; coordinates stay in pixels.
//! Tables without content (no random points, clustering off, ...) are skipped.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pathdist::classify::SpatialPoint;
use pathdist::geom2::{to_metric_area, Path as Polygon};
use pathdist::interpoint::{InterpointDistances, InterpointMode};
use pathdist::options::Options;
use pathdist::profile::{Batch, Profile, SessionSummary};
use polars::prelude::*;
use serde::Serialize;

pub const PROFILE_SUMMARY: &str = "profile_summary.csv";
pub const SESSION_SUMMARY: &str = "session_summary.json";

fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::debug!(rows = df.height(), path = %path.display(), "csv written");
    Ok(())
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn profile_summary(profiles: &[&Profile]) -> PolarsResult<DataFrame> {
    let rows: Vec<_> = profiles.iter().map(|p| (p, p.summary())).collect();
    df!(
        "Profile ID" => rows.iter().map(|(_, s)| s.id.clone()).collect::<Vec<_>>(),
        "Input file" => rows.iter().map(|(_, s)| s.input_file.clone()).collect::<Vec<_>>(),
        "Comment" => rows.iter().map(|(_, s)| s.comment.clone()).collect::<Vec<_>>(),
        "Unit" => rows.iter().map(|(p, _)| p.metric_unit.clone()).collect::<Vec<_>>(),
        "Path length" => rows.iter().map(|(_, s)| s.path_length).collect::<Vec<_>>(),
        "Particles" => rows.iter().map(|(_, s)| count(s.particles)).collect::<Vec<_>>(),
        "Positive particles" => rows.iter().map(|(_, s)| count(s.positive_particles)).collect::<Vec<_>>(),
        "Positive shell particles" => rows.iter().map(|(_, s)| count(s.positive_shell_particles)).collect::<Vec<_>>(),
        "Negative shell particles" => rows.iter().map(|(_, s)| count(s.negative_shell_particles)).collect::<Vec<_>>(),
        "Positive shell or associated" => rows.iter().map(|(_, s)| count(s.shell_positive_or_associated)).collect::<Vec<_>>(),
        "Associated particles" => rows.iter().map(|(_, s)| count(s.associated_particles)).collect::<Vec<_>>(),
        "Discarded particles" => rows.iter().map(|(_, s)| count(s.discarded_particles)).collect::<Vec<_>>(),
        "Shape" => rows.iter().map(|(_, s)| s.shape.map(|x| x.as_str())).collect::<Vec<_>>(),
        "Curvature (centroid)" => rows.iter().map(|(_, s)| s.curvature_centroid).collect::<Vec<_>>(),
        "Curvature (deviation from straight)" => rows.iter().map(|(_, s)| s.curvature_dev_from_straight).collect::<Vec<_>>(),
        "Warnings" => rows.iter().map(|(p, _)| count(p.warnings.len())).collect::<Vec<_>>(),
    )
}

/// Column buffers for a table of classified points.
#[derive(Default)]
struct PointRows {
    id: Vec<String>,
    file: Vec<String>,
    run: Vec<Option<u32>>,
    number: Vec<u32>,
    x: Vec<f64>,
    y: Vec<f64>,
    dist: Vec<Option<f64>>,
    lateral: Vec<Option<f64>>,
    norm_lateral: Vec<Option<f64>>,
    in_shell: Vec<Option<bool>>,
    associated: Vec<Option<bool>>,
    cluster: Vec<Option<u32>>,
}

impl PointRows {
    fn push_set(&mut self, profile: &Profile, run: Option<usize>, points: &[SpatialPoint]) {
        for (i, sp) in points.iter().enumerate() {
            self.id.push(profile.id.clone());
            self.file.push(profile.input_file.clone());
            self.run.push(run.map(count));
            self.number.push(count(i + 1));
            self.x.push(sp.point.x);
            self.y.push(sp.point.y);
            self.dist.push(sp.dist_to_path.map(|d| profile.metric(d)));
            self.lateral.push(sp.lateral_dist_path.map(|d| profile.metric(d)));
            self.norm_lateral.push(sp.norm_lateral_dist_path);
            self.in_shell.push(sp.is_within_shell);
            self.associated.push(sp.is_associated_with_path);
            self.cluster.push(sp.cluster_id.map(count));
        }
    }

    fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    fn into_frame(self, with_run: bool) -> PolarsResult<DataFrame> {
        let mut df = df!(
            "Profile ID" => self.id,
            "Input file" => self.file,
            "Run" => self.run,
            "Point" => self.number,
            "X (px)" => self.x,
            "Y (px)" => self.y,
            "Distance to path" => self.dist,
            "Lateral distance" => self.lateral,
            "Normalized lateral distance" => self.norm_lateral,
            "Within shell" => self.in_shell,
            "Associated with path" => self.associated,
            "Cluster" => self.cluster,
        )?;
        if !with_run {
            df = df.drop("Run")?;
        }
        Ok(df)
    }
}

fn cluster_summary(profiles: &[&Profile]) -> PolarsResult<Option<DataFrame>> {
    let mut id = Vec::new();
    let mut file = Vec::new();
    let mut cluster = Vec::new();
    let mut size = Vec::new();
    let mut cx = Vec::new();
    let mut cy = Vec::new();
    let mut area = Vec::new();
    let mut dist = Vec::new();
    let mut nearest = Vec::new();
    let mut nearest_dist = Vec::new();
    for p in profiles {
        for c in &p.clusters {
            id.push(p.id.clone());
            file.push(p.input_file.clone());
            cluster.push(count(c.id));
            size.push(count(c.len()));
            cx.push(c.centroid.x);
            cy.push(c.centroid.y);
            area.push(to_metric_area(Polygon::closed(c.hull.clone()).area(), p.pixel_width));
            dist.push(c.dist_to_path.map(|d| p.metric(d)));
            nearest.push(c.nearest_cluster.map(|n| count(n.id)));
            nearest_dist.push(c.nearest_cluster.map(|n| p.metric(n.dist)));
        }
    }
    if id.is_empty() {
        return Ok(None);
    }
    df!(
        "Profile ID" => id,
        "Input file" => file,
        "Cluster" => cluster,
        "Particles" => size,
        "Centroid X (px)" => cx,
        "Centroid Y (px)" => cy,
        "Hull area" => area,
        "Distance to path" => dist,
        "Nearest cluster" => nearest,
        "Distance to nearest cluster" => nearest_dist,
    )
    .map(Some)
}

#[derive(Default)]
struct DistanceRows {
    id: Vec<String>,
    file: Vec<String>,
    run: Vec<Option<u32>>,
    relation: Vec<&'static str>,
    mode: Vec<&'static str>,
    kind: Vec<&'static str>,
    dist: Vec<f64>,
}

impl DistanceRows {
    fn push(&mut self, profile: &Profile, run: Option<usize>, d: &InterpointDistances) {
        let mode = match d.mode {
            InterpointMode::All => "all",
            InterpointMode::NearestNeighbour => "nearest neighbour",
        };
        for (kind, values) in [("shortest", &d.shortest), ("lateral", &d.lateral)] {
            for &v in values {
                self.id.push(profile.id.clone());
                self.file.push(profile.input_file.clone());
                self.run.push(run.map(count));
                self.relation.push(d.relation.as_str());
                self.mode.push(mode);
                self.kind.push(kind);
                self.dist.push(profile.metric(v));
            }
        }
    }

    fn into_frame(self) -> PolarsResult<Option<DataFrame>> {
        if self.id.is_empty() {
            return Ok(None);
        }
        df!(
            "Profile ID" => self.id,
            "Input file" => self.file,
            "Run" => self.run,
            "Relation" => self.relation,
            "Mode" => self.mode,
            "Distance kind" => self.kind,
            "Distance" => self.dist,
        )
        .map(Some)
    }
}

fn interpoint_summary(profiles: &[&Profile]) -> PolarsResult<Option<DataFrame>> {
    let mut rows = DistanceRows::default();
    for p in profiles {
        for d in &p.interpoint {
            rows.push(p, None, d);
        }
        for (run, mc) in p.monte_carlo.iter().enumerate() {
            for d in &mc.interpoint {
                rows.push(p, Some(run + 1), d);
            }
        }
    }
    rows.into_frame()
}

/// Write every non-empty table of `batch` into `dir`; returns the files written.
pub fn write_tables(dir: &Path, batch: &Batch) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let profiles: Vec<&Profile> = batch.processed().collect();
    let mut written = Vec::new();
    let mut emit = |name: &str, df: Option<DataFrame>| -> Result<()> {
        if let Some(mut df) = df {
            let path = dir.join(name);
            write_csv(&path, &mut df)?;
            written.push(path);
        }
        Ok(())
    };

    emit(PROFILE_SUMMARY, Some(profile_summary(&profiles)?))?;

    let mut particles = PointRows::default();
    let mut random = PointRows::default();
    let mut grid = PointRows::default();
    let mut simulated = PointRows::default();
    for p in &profiles {
        particles.push_set(p, None, &p.particles);
        random.push_set(p, None, &p.random_points);
        grid.push_set(p, None, &p.grid_points);
        for (run, mc) in p.monte_carlo.iter().enumerate() {
            simulated.push_set(p, Some(run + 1), &mc.points);
        }
    }
    emit("particle_summary.csv", Some(particles.into_frame(false)?))?;
    for (name, rows) in [("random_summary.csv", random), ("grid_summary.csv", grid)] {
        if !rows.is_empty() {
            emit(name, Some(rows.into_frame(false)?))?;
        }
    }
    if !simulated.is_empty() {
        emit("monte_carlo_summary.csv", Some(simulated.into_frame(true)?))?;
    }
    emit("cluster_summary.csv", cluster_summary(&profiles)?)?;
    emit("interpoint_summary.csv", interpoint_summary(&profiles)?)?;
    Ok(written)
}

#[derive(Serialize)]
struct SessionReport<'a> {
    version: &'static str,
    options: &'a Options,
    #[serde(flatten)]
    summary: &'a SessionSummary,
    warnings: Vec<ProfileWarnings>,
}

#[derive(Serialize)]
struct ProfileWarnings {
    profile: String,
    warnings: Vec<String>,
}

/// Write the session summary (options, outcome per profile, warnings) as JSON.
pub fn write_session(
    dir: &Path,
    options: &Options,
    batch: &Batch,
    summary: &SessionSummary,
) -> Result<PathBuf> {
    let report = SessionReport {
        version: pathdist::VERSION,
        options,
        summary,
        warnings: batch
            .processed()
            .filter(|p| p.has_warnings())
            .map(|p| ProfileWarnings {
                profile: p.label().to_string(),
                warnings: p.warnings.iter().map(ToString::to_string).collect(),
            })
            .collect(),
    };
    let path = dir.join(SESSION_SUMMARY);
    std::fs::write(&path, serde_json::to_vec_pretty(&report)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pathdist::interpoint::{InterpointMode, Relation};
use pathdist::montecarlo::SimulationWindow;
use pathdist::options::{BatchContext, Options};
use pathdist::profile::{process_batch, FailedProfile};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod input;
mod output;
mod provenance;

#[derive(Parser)]
#[command(name = "pathdist")]
#[command(version)]
#[command(about = "Distances of particles to a membrane path, with Monte Carlo null models")]
struct Cmd {
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Process profile files and write summary tables to --out
    Run(RunArgs),
    /// Print provenance of this build and of a previous run
    Report {
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Profile files; duplicates are processed once
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[arg(long, default_value = "out")]
    out: PathBuf,
    /// Options as JSON; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    spatial_resolution: Option<f64>,
    #[arg(long)]
    shell_width: Option<f64>,
    /// Interpoint relations to compute (enables interpoint distances)
    #[arg(long, value_enum, value_delimiter = ',', num_args = 1..)]
    interpoint: Option<Vec<RelationArg>>,
    #[arg(long, value_enum)]
    interpoint_mode: Option<ModeArg>,
    /// Cluster particles closer than this (enables clustering)
    #[arg(long)]
    cluster_dist: Option<f64>,
    /// Number of Monte Carlo runs per profile (enables simulation)
    #[arg(long)]
    monte_carlo_runs: Option<usize>,
    #[arg(long, value_enum)]
    window: Option<WindowArg>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum RelationArg {
    ParticleParticle,
    RandomParticle,
    ParticleSimulated,
    SimulatedParticle,
    SimulatedSimulated,
}

impl From<RelationArg> for Relation {
    fn from(r: RelationArg) -> Self {
        match r {
            RelationArg::ParticleParticle => Relation::ParticleParticle,
            RelationArg::RandomParticle => Relation::RandomParticle,
            RelationArg::ParticleSimulated => Relation::ParticleSimulated,
            RelationArg::SimulatedParticle => Relation::SimulatedParticle,
            RelationArg::SimulatedSimulated => Relation::SimulatedSimulated,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    All,
    NearestNeighbour,
}

#[derive(Clone, Copy, ValueEnum)]
enum WindowArg {
    Shell,
    PositiveShell,
    NegativeShell,
}

impl RunArgs {
    fn options(&self) -> Result<Options> {
        let mut opt = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing options from {}", path.display()))?
            }
            None => Options::default(),
        };
        if let Some(v) = self.spatial_resolution {
            opt.spatial_resolution = v;
        }
        if let Some(v) = self.shell_width {
            opt.shell_width = v;
        }
        if let Some(relations) = &self.interpoint {
            opt.interpoint.enabled = true;
            opt.interpoint.relations = relations.iter().map(|&r| r.into()).collect();
        }
        if let Some(mode) = self.interpoint_mode {
            opt.interpoint.mode = match mode {
                ModeArg::All => InterpointMode::All,
                ModeArg::NearestNeighbour => InterpointMode::NearestNeighbour,
            };
        }
        if let Some(d) = self.cluster_dist {
            opt.clustering.enabled = true;
            opt.clustering.within_cluster_dist = d;
        }
        if let Some(runs) = self.monte_carlo_runs {
            opt.monte_carlo.enabled = runs > 0;
            opt.monte_carlo.runs = runs;
        }
        if let Some(w) = self.window {
            opt.monte_carlo.window = match w {
                WindowArg::Shell => SimulationWindow::Shell,
                WindowArg::PositiveShell => SimulationWindow::PositiveShell,
                WindowArg::NegativeShell => SimulationWindow::NegativeShell,
            };
        }
        if self.seed.is_some() {
            opt.monte_carlo.seed = self.seed;
        }
        opt.validate()?;
        Ok(opt)
    }
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = match cmd.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .init();
    match cmd.action {
        Action::Run(args) => run(&args),
        Action::Report { from } => report(from.as_deref()),
    }
}

fn run(args: &RunArgs) -> Result<()> {
    let options = args.options()?;
    let mut seen = HashSet::new();
    let files: Vec<&PathBuf> = args.inputs.iter().filter(|p| seen.insert(*p)).collect();
    tracing::info!(files = files.len(), out = %args.out.display(), "run");

    let mut unreadable = Vec::new();
    let mut inputs = Vec::new();
    for file in &files {
        match input::read_profile(file) {
            Ok(p) => inputs.push(p),
            Err(e) => {
                tracing::error!(file = %file.display(), "{e:#}");
                unreadable.push(FailedProfile {
                    profile: file.display().to_string(),
                    error: format!("{e:#}"),
                });
            }
        }
    }

    let mut ctx = BatchContext::default();
    let batch = process_batch(inputs, &options, &mut ctx);
    let mut summary = batch.session_summary();
    summary.failed.splice(0..0, unreadable);

    let mut outputs = output::write_tables(&args.out, &batch)?;
    let session = output::write_session(&args.out, &options, &batch, &summary)?;
    outputs.push(session.clone());
    let mut payload = provenance::Payload::new(serde_json::to_value(&options)?);
    payload.inputs = files.into_iter().cloned().collect();
    payload.outputs = outputs;
    provenance::write_sidecar(&session, payload)?;

    tracing::info!(
        processed = summary.processed,
        failed = summary.failed.len(),
        with_warnings = summary.with_warnings.len(),
        without_particles = summary.without_particles.len(),
        "session done"
    );
    for f in &summary.failed {
        tracing::warn!(profile = %f.profile, "not processed: {}", f.error);
    }
    if summary.aborted {
        anyhow::bail!("session aborted");
    }
    Ok(())
}

fn report(from: Option<&Path>) -> Result<()> {
    let mut obj = serde_json::json!({
        "code_rev": provenance::current_git_rev(),
        "version": pathdist::VERSION,
    });
    if let Some(dir) = from {
        let sidecar = provenance::provenance_path(&dir.join(output::SESSION_SUMMARY));
        if sidecar.exists() {
            let text = std::fs::read_to_string(&sidecar)
                .with_context(|| format!("reading {}", sidecar.display()))?;
            obj["session"] = serde_json::from_str(&text)?;
        }
        let table = dir.join(output::PROFILE_SUMMARY);
        if table.exists() {
            let df = LazyCsvReader::new(&table)
                .with_infer_schema_length(Some(100))
                .finish()?
                .collect()?;
            tracing::debug!(rows = df.height(), cols = df.width(), "profile_summary_shape");
            obj["profiles"] = df.height().into();
            obj["columns"] = df
                .get_column_names()
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .into();
        }
    }
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const PROFILE: &str = "\
PROFILE_ID 7
PIXELWIDTH 1.0 nm
PATH
0, 0
100, 0
END
PARTICLES
50, 5
60, -8
END
";

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["pathdist", "run"];
        full.extend_from_slice(argv);
        match Cmd::try_parse_from(full).unwrap().action {
            Action::Run(args) => args,
            Action::Report { .. } => unreachable!(),
        }
    }

    #[test]
    fn flags_override_config() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("opt.json");
        fs::write(&config, r#"{"shell_width": 150.0, "spatial_resolution": 10.0}"#).unwrap();
        let args = run_args(&[
            "a.d2p",
            "--config",
            config.to_str().unwrap(),
            "--shell-width",
            "80",
            "--interpoint",
            "particle-particle,simulated-simulated",
            "--monte-carlo-runs",
            "5",
            "--window",
            "positive-shell",
        ]);
        let opt = args.options().unwrap();
        assert_eq!(opt.shell_width, 80.0);
        assert_eq!(opt.spatial_resolution, 10.0);
        assert!(opt.interpoint.enabled);
        assert_eq!(
            opt.interpoint.relations,
            vec![Relation::ParticleParticle, Relation::SimulatedSimulated]
        );
        assert!(opt.monte_carlo.enabled);
        assert_eq!(opt.monte_carlo.runs, 5);
        assert_eq!(opt.monte_carlo.window, SimulationWindow::PositiveShell);
        assert!(!opt.clustering.enabled);
    }

    #[test]
    fn invalid_options_rejected_up_front() {
        let args = run_args(&["a.d2p", "--shell-width=-1"]);
        assert!(args.options().is_err());
    }

    #[test]
    fn run_writes_reports_and_records_unreadable_files() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("p7.d2p");
        let bad = dir.path().join("broken.d2p");
        fs::write(&good, PROFILE).unwrap();
        fs::write(&bad, "PATH\n0,0\n1,0\nEND\n").unwrap();
        let out = dir.path().join("out");
        let args = run_args(&[
            good.to_str().unwrap(),
            bad.to_str().unwrap(),
            good.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--cluster-dist",
            "20",
        ]);
        run(&args).unwrap();

        let session: serde_json::Value =
            serde_json::from_slice(&fs::read(out.join(output::SESSION_SUMMARY)).unwrap()).unwrap();
        assert_eq!(session["processed"], 1);
        assert_eq!(session["failed"].as_array().unwrap().len(), 1);
        assert!(session["failed"][0]["error"]
            .as_str()
            .unwrap()
            .contains("no valid pixel width"));
        assert!(out.join(output::PROFILE_SUMMARY).exists());
        assert!(out.join("particle_summary.csv").exists());
        assert!(out.join("cluster_summary.csv").exists());
        assert!(!out.join("monte_carlo_summary.csv").exists());

        let prov: serde_json::Value = serde_json::from_slice(
            &fs::read(out.join("session_summary.provenance.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(prov["inputs"].as_array().unwrap().len(), 2);
        assert_eq!(prov["params"]["clustering"]["enabled"], true);

        report(Some(&out)).unwrap();
    }
}

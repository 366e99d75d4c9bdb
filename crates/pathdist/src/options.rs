//! Batch configuration and batch-scoped context.
//!
//! `Options` is read-only for the duration of a batch and uses metric units
//! (the unit given with each profile's pixel width). `BatchContext` carries the
//! mutable batch state: the cancel flag and the polarity contract.

use serde::{Deserialize, Serialize};

use crate::cancel::CancelFlag;
use crate::error::{ProfileError, ProfileResult};
use crate::interpoint::{InterpointMode, Relation};
use crate::montecarlo::SimulationWindow;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Points within this distance of the path are "associated" with it.
    pub spatial_resolution: f64,
    /// Half-width of the band around the path included in the analysis.
    pub shell_width: f64,
    /// Minimum chord/path length ratio for a crossing path to count as flat.
    pub flat_threshold: f64,
    pub interpoint: InterpointOptions,
    pub clustering: ClusterOptions,
    pub monte_carlo: MonteCarloOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            spatial_resolution: 25.0,
            shell_width: 200.0,
            flat_threshold: 0.98,
            interpoint: InterpointOptions::default(),
            clustering: ClusterOptions::default(),
            monte_carlo: MonteCarloOptions::default(),
        }
    }
}

impl Options {
    pub fn validate(&self) -> ProfileResult<()> {
        let invalid = |msg: &str| Err(ProfileError::InvalidOptions(msg.to_string()));
        if !(self.spatial_resolution.is_finite() && self.spatial_resolution >= 0.0) {
            return invalid("spatial_resolution must be a non-negative number");
        }
        if !(self.shell_width.is_finite() && self.shell_width >= 0.0) {
            return invalid("shell_width must be a non-negative number");
        }
        if !(self.flat_threshold > 0.0 && self.flat_threshold <= 1.0) {
            return invalid("flat_threshold must lie in (0, 1]");
        }
        if !self.clustering.within_cluster_dist.is_finite() {
            return invalid("within_cluster_dist must be finite");
        }
        if self.interpoint.enabled && !(self.interpoint.shortest || self.interpoint.lateral) {
            return invalid("interpoint distances enabled but neither shortest nor lateral requested");
        }
        if self.monte_carlo.enabled && self.monte_carlo.max_attempts_per_point == 0 {
            return invalid("max_attempts_per_point must be positive");
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpointOptions {
    pub enabled: bool,
    pub mode: InterpointMode,
    /// Straight-line distances.
    pub shortest: bool,
    /// Distances measured along the path.
    pub lateral: bool,
    pub relations: Vec<Relation>,
}

impl Default for InterpointOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: InterpointMode::NearestNeighbour,
            shortest: true,
            lateral: true,
            relations: vec![Relation::ParticleParticle],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    pub enabled: bool,
    /// Maximal distance between neighbouring members of a cluster. Negative disables clustering.
    pub within_cluster_dist: f64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            within_cluster_dist: 50.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloOptions {
    pub enabled: bool,
    pub runs: usize,
    pub window: SimulationWindow,
    /// Fixed seed for reproducible runs; drawn from the OS when `None`.
    pub seed: Option<u64>,
    /// Rejected draws tolerated between two accepted points before a run gives up.
    pub max_attempts_per_point: usize,
}

impl Default for MonteCarloOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            runs: 99,
            window: SimulationWindow::Shell,
            seed: None,
            max_attempts_per_point: 10_000,
        }
    }
}

/// Mutable state scoped to one batch of profiles.
#[derive(Debug, Default)]
pub struct BatchContext {
    pub cancel: CancelFlag,
    /// Whether polarity is defined, as established by the first profile (and its id).
    polarity: Option<(bool, String)>,
}

impl BatchContext {
    pub fn new(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            polarity: None,
        }
    }

    /// Polarity definedness established by the first registered profile.
    pub fn polarity_defined(&self) -> Option<bool> {
        self.polarity.as_ref().map(|(d, _)| *d)
    }

    /// First write wins; later profiles must agree with it.
    pub fn register_polarity(&mut self, profile_id: &str, defined: bool) -> ProfileResult<()> {
        match &self.polarity {
            None => {
                self.polarity = Some((defined, profile_id.to_string()));
                Ok(())
            }
            Some((d, _)) if *d == defined => Ok(()),
            Some((_, first)) => Err(ProfileError::InconsistentPolarity {
                first: first.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let opt = Options::default();
        assert!(opt.validate().is_ok());
        assert_eq!(opt.spatial_resolution, 25.0);
        assert_eq!(opt.shell_width, 200.0);
    }

    #[test]
    fn rejects_negative_shell() {
        let opt = Options {
            shell_width: -1.0,
            ..Options::default()
        };
        assert!(matches!(opt.validate(), Err(ProfileError::InvalidOptions(_))));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let opt: Options =
            serde_json::from_str(r#"{"shell_width": 150.0, "monte_carlo": {"enabled": true, "runs": 3}}"#)
                .unwrap();
        assert_eq!(opt.shell_width, 150.0);
        assert!(opt.monte_carlo.enabled);
        assert_eq!(opt.monte_carlo.runs, 3);
        assert_eq!(opt.monte_carlo.window, SimulationWindow::Shell);
        assert_eq!(opt.spatial_resolution, 25.0);
    }

    #[test]
    fn polarity_first_write_wins() {
        let mut ctx = BatchContext::default();
        assert_eq!(ctx.polarity_defined(), None);
        ctx.register_polarity("a", true).unwrap();
        ctx.register_polarity("b", true).unwrap();
        assert_eq!(ctx.polarity_defined(), Some(true));
        let err = ctx.register_polarity("c", false).unwrap_err();
        assert!(matches!(err, ProfileError::InconsistentPolarity { ref first } if first == "a"));
    }
}

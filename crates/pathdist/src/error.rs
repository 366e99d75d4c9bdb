//! Error taxonomy.
//!
//! - `GeometryError`: invalid border or hole geometry; fatal to one profile.
//! - `ProfileError`: everything that stops a profile, including cooperative
//!   cancellation (`Aborted`), which also stops the batch.
//!
//! Discarded points are not errors; see `profile::ProfileWarning`.

use thiserror::Error;

use crate::cancel::Aborted;

/// Which path of a profile an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathRole {
    Border,
    /// Zero-based hole index.
    Hole(usize),
}

impl std::fmt::Display for PathRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Border => write!(f, "path"),
            Self::Hole(i) => write!(f, "hole {}", i + 1),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("{role} needs at least {required} distinct nodes, got {found}")]
    TooFewNodes {
        role: PathRole,
        required: usize,
        found: usize,
    },

    #[error("{role} invalid (crossing segments {first} and {second})")]
    SelfIntersecting {
        role: PathRole,
        first: usize,
        second: usize,
    },

    #[error("profile hole {} is not a simple polygon", .index + 1)]
    InvalidHole { index: usize },

    #[error("profile hole {} overlaps with hole {}", .first + 1, .second + 1)]
    OverlappingHoles { first: usize, second: usize },

    #[error("{role} has a non-finite coordinate")]
    NonFinite { role: PathRole },
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("polarity is defined for {first} but not for this profile, or vice versa; it must be defined for all profiles or none")]
    InconsistentPolarity { first: String },

    #[error("Monte Carlo run {run}: placed {placed} of {target} points before giving up after {attempts} attempts")]
    SamplingExhausted {
        run: usize,
        placed: usize,
        target: usize,
        attempts: usize,
    },

    #[error(transparent)]
    Aborted(#[from] Aborted),
}

impl ProfileError {
    #[inline]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

pub type ProfileResult<T> = Result<T, ProfileError>;

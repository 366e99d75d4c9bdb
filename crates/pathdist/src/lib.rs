//! Spatial relationship of labelled particles to a membrane-like path.
//!
//! A profile is a border path (open polyline) with optional holes and point
//! sets (particles, random points, grid points) in image pixel coordinates.
//! The crate classifies every point against the path, clusters particles,
//! computes interpoint distances and runs Monte Carlo simulations of randomly
//! placed points as a null model.
//!
//! Layering
//! - `geom2`: plain 2D geometry.
//! - `validate`, `classify`, `cluster`, `interpoint`, `montecarlo`: the stages.
//! - `profile`: runs the stages per profile and per batch.
//!
//! No I/O happens here; parsing and report writing live in the `cli` crate.

pub mod cancel;
pub mod classify;
pub mod cluster;
pub mod error;
pub mod geom2;
pub mod interpoint;
pub mod montecarlo;
pub mod options;
pub mod profile;
pub mod validate;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for callers driving a batch.
pub mod prelude {
    pub use crate::cancel::{Aborted, CancelFlag};
    pub use crate::classify::{DiscardReason, PointKind, Polarity, Shape, SpatialPoint};
    pub use crate::error::{GeometryError, ProfileError, ProfileResult};
    pub use crate::geom2::{Path, Point};
    pub use crate::interpoint::{InterpointMode, Relation};
    pub use crate::montecarlo::SimulationWindow;
    pub use crate::options::{BatchContext, Options};
    pub use crate::profile::{
        process_batch, Batch, Profile, ProfileInput, ProfileStatus, ProfileSummary, ProfileWarning,
        SessionSummary,
    };
}

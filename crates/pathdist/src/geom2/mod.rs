//! 2D Geometry Kernel.
//!
//! Purpose
//! - Points, paths (open polylines and implicitly closed polygons) and the
//!   predicates the classification pipeline is built on: segment intersection,
//!   point–segment distance, crossing numbers, point-in-polygon, projection.
//!
//! Conventions
//! - All coordinates are pixels; conversion to metric units happens at the
//!   edges (`to_pixel_units`, `to_metric_units`).
//! - Exact float comparisons are used where the classification relies on them
//!   (shared endpoints, duplicate points); there is no global epsilon.
//! - Plain O(n·m) loops; inputs are hundreds of nodes, not millions.

mod path;
mod segment;
mod types;
mod util;

pub use path::{is_within_polygon, Path, Projection};
pub use segment::{
    point_segment_distance, project_on_line, segment_crossing_number, segment_intersection,
};
pub use types::{
    distance, to_metric_area, to_metric_units, to_pixel_units, BoundingBox, Point,
};
pub use util::convex_hull;

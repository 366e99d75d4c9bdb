//! Cluster Engine.
//!
//! Greedy single forward pass: in input order, an unassigned point joins the
//! cluster of the first other point within the threshold that already has one,
//! otherwise it starts a new cluster. Two clusters that only later turn out to
//! be connected through a new point are not merged, so the partition depends on
//! the input order.

use serde::Serialize;

use crate::cancel::{Aborted, CancelFlag};
use crate::classify::{lateral_dist_between, PathFrame, SpatialPoint};
use crate::geom2::{convex_hull, distance, Path, Point};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NearestCluster {
    pub id: usize,
    /// Distance along the path between the two hull centroids (pixels).
    pub dist: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cluster {
    pub id: usize,
    /// Indices into the clustered point list, in input order.
    pub members: Vec<usize>,
    pub hull: Vec<Point>,
    pub centroid: Point,
    /// Signed perpendicular distance of the hull centroid to the path (pixels).
    pub dist_to_path: Option<f64>,
    /// `None` when there is no other cluster reachable along the path.
    pub nearest_cluster: Option<NearestCluster>,
}

impl Cluster {
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Cluster id per point; all `None` when `within_cluster_dist` is negative.
pub fn assign_clusters(
    points: &[Point],
    within_cluster_dist: f64,
    cancel: &CancelFlag,
) -> Result<Vec<Option<usize>>, Aborted> {
    let mut ids: Vec<Option<usize>> = vec![None; points.len()];
    if within_cluster_dist < 0.0 {
        return Ok(ids);
    }
    let mut next_id = 0;
    for i in 0..points.len() {
        cancel.check()?;
        if ids[i].is_some() {
            continue;
        }
        let joined = (0..points.len())
            .filter(|&j| j != i)
            .find_map(|j| match ids[j] {
                Some(c) if distance(points[i], points[j]) <= within_cluster_dist => Some(c),
                _ => None,
            });
        ids[i] = Some(joined.unwrap_or_else(|| {
            next_id += 1;
            next_id - 1
        }));
    }
    Ok(ids)
}

/// Partition `points` into clusters, record each point's cluster id and
/// compute the per-cluster hull, centroid distance and nearest cluster.
pub fn cluster_points(
    points: &mut [SpatialPoint],
    within_cluster_dist: f64,
    frame: &PathFrame<'_>,
    cancel: &CancelFlag,
) -> Result<Vec<Cluster>, Aborted> {
    let coords: Vec<Point> = points.iter().map(|p| p.point).collect();
    let ids = assign_clusters(&coords, within_cluster_dist, cancel)?;

    let mut members: Vec<Vec<usize>> = Vec::new();
    for (i, (sp, id)) in points.iter_mut().zip(&ids).enumerate() {
        sp.cluster_id = *id;
        if let Some(c) = *id {
            if c >= members.len() {
                members.resize_with(c + 1, Vec::new);
            }
            members[c].push(i);
        }
    }

    let mut clusters: Vec<Cluster> = members
        .into_iter()
        .enumerate()
        .map(|(id, members)| {
            let pts: Vec<Point> = members.iter().map(|&i| coords[i]).collect();
            let hull = convex_hull(&pts);
            let centroid = Path::closed(hull.clone()).centroid();
            Cluster {
                id,
                members,
                hull,
                centroid,
                dist_to_path: frame.signed_dist(centroid),
                nearest_cluster: None,
            }
        })
        .collect();

    for i in 0..clusters.len() {
        cancel.check()?;
        let mut best: Option<NearestCluster> = None;
        for j in 0..clusters.len() {
            if i == j {
                continue;
            }
            let Some(d) = lateral_dist_between(clusters[i].centroid, clusters[j].centroid, frame.path)
            else {
                continue;
            };
            if best.map_or(true, |b| d < b.dist) {
                best = Some(NearestCluster {
                    id: clusters[j].id,
                    dist: d,
                });
            }
        }
        clusters[i].nearest_cluster = best;
    }
    Ok(clusters)
}

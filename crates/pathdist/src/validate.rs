//! Path Validator.
//!
//! A border path needs two distinct nodes and no crossing of non-adjacent
//! segments. Holes need three nodes, must be simple polygons and must not
//! overlap each other. Touching at a shared endpoint is not a crossing.

use crate::error::{GeometryError, PathRole};
use crate::geom2::Path;

/// Validate the profile border.
pub fn validate_path(path: &Path) -> Result<(), GeometryError> {
    validate_polyline(path, PathRole::Border, 2)
}

/// Validate the holes one by one, then pairwise.
pub fn validate_holes(holes: &[Path]) -> Result<(), GeometryError> {
    for (index, hole) in holes.iter().enumerate() {
        validate_polyline(hole, PathRole::Hole(index), 3)?;
        if !hole.is_simple_polygon() {
            return Err(GeometryError::InvalidHole { index });
        }
    }
    for (i, a) in holes.iter().enumerate() {
        for (j, b) in holes.iter().enumerate().skip(i + 1) {
            if a.overlaps_polygon(b) {
                return Err(GeometryError::OverlappingHoles {
                    first: i,
                    second: j,
                });
            }
        }
    }
    Ok(())
}

fn validate_polyline(path: &Path, role: PathRole, required: usize) -> Result<(), GeometryError> {
    if path.len() < required {
        return Err(GeometryError::TooFewNodes {
            role,
            required,
            found: path.len(),
        });
    }
    if path.nodes().iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
        return Err(GeometryError::NonFinite { role });
    }
    match path.first_self_intersection() {
        Some((first, second)) => Err(GeometryError::SelfIntersecting {
            role,
            first,
            second,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom2::Point;
    use nalgebra::vector;
    use proptest::prelude::*;

    fn square(x: f64, y: f64, s: f64) -> Path {
        Path::closed(vec![
            vector![x, y],
            vector![x + s, y],
            vector![x + s, y + s],
            vector![x, y + s],
        ])
    }

    #[test]
    fn border_needs_two_nodes() {
        let p = Path::open(vec![vector![1.0, 1.0], vector![1.0, 1.0]]);
        assert_eq!(
            validate_path(&p),
            Err(GeometryError::TooFewNodes {
                role: PathRole::Border,
                required: 2,
                found: 1
            })
        );
    }

    #[test]
    fn border_crossing_rejected() {
        let p = Path::open(vec![
            vector![0.0, 0.0],
            vector![10.0, 0.0],
            vector![10.0, 5.0],
            vector![5.0, -5.0],
        ]);
        assert_eq!(
            validate_path(&p),
            Err(GeometryError::SelfIntersecting {
                role: PathRole::Border,
                first: 0,
                second: 2
            })
        );
        let msg = validate_path(&p).unwrap_err().to_string();
        assert_eq!(msg, "path invalid (crossing segments 0 and 2)");
    }

    #[test]
    fn non_finite_rejected() {
        let p = Path::open(vec![vector![0.0, 0.0], vector![f64::NAN, 1.0]]);
        assert!(matches!(validate_path(&p), Err(GeometryError::NonFinite { .. })));
    }

    #[test]
    fn holes() {
        assert!(validate_holes(&[square(0.0, 0.0, 1.0), square(2.0, 0.0, 1.0)]).is_ok());

        let overlapping = [square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)];
        assert_eq!(
            validate_holes(&overlapping),
            Err(GeometryError::OverlappingHoles { first: 0, second: 1 })
        );
        let nested = [square(0.0, 0.0, 10.0), square(2.0, 2.0, 1.0)];
        assert!(matches!(
            validate_holes(&nested),
            Err(GeometryError::OverlappingHoles { .. })
        ));

        let bowtie = Path::closed(vec![
            vector![0.0, 0.0],
            vector![2.0, 2.0],
            vector![2.0, 0.0],
            vector![0.0, 2.0],
        ]);
        assert!(matches!(
            validate_holes(&[square(5.0, 5.0, 1.0), bowtie]),
            Err(GeometryError::SelfIntersecting {
                role: PathRole::Hole(1),
                ..
            })
        ));

        let line = Path::closed(vec![vector![0.0, 0.0], vector![1.0, 0.0]]);
        assert!(matches!(
            validate_holes(&[line]),
            Err(GeometryError::TooFewNodes { required: 3, .. })
        ));
    }

    fn monotone(steps: &[(f64, f64)]) -> Vec<Point> {
        let mut x = 0.0;
        steps
            .iter()
            .map(|&(dx, y)| {
                x += dx;
                vector![x, y]
            })
            .collect()
    }

    proptest! {
        #[test]
        fn x_monotone_paths_are_accepted(
            steps in prop::collection::vec((0.1f64..5.0, -10.0f64..10.0), 2..24)
        ) {
            let path = Path::open(monotone(&steps));
            prop_assert!(validate_path(&path).is_ok());
        }

        #[test]
        fn injected_crossing_is_rejected(
            steps in prop::collection::vec((0.1f64..5.0, -10.0f64..10.0), 3..24)
        ) {
            let mut nodes = monotone(&steps);
            // vertical stroke through the middle of the first segment
            let xm = (nodes[0].x + nodes[1].x) / 2.0;
            nodes.push(vector![xm, 100.0]);
            nodes.push(vector![xm, -100.0]);
            let path = Path::open(nodes);
            let is_crossing = matches!(
                validate_path(&path),
                Err(GeometryError::SelfIntersecting { .. })
            );
            prop_assert!(is_crossing);
        }
    }
}

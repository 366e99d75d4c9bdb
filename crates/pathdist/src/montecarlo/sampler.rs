//! Uniform point draws with per-run replay tokens.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::geom2::{BoundingBox, Point};

/// `(seed, run index)`: every run draws from its own reproducible stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    #[inline]
    pub fn to_std_rng(self) -> StdRng {
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        StdRng::seed_from_u64(mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15))))
    }
}

/// Uniform point inside `bbox`; a degenerate box yields its edge coordinate.
#[inline]
pub fn draw_in_box<R: Rng>(rng: &mut R, bbox: &BoundingBox) -> Point {
    Point::new(
        bbox.min.x + rng.gen::<f64>() * bbox.width(),
        bbox.min.y + rng.gen::<f64>() * bbox.height(),
    )
}

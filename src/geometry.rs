//! Spawn geometry: where defenders stand around a settlement
//!
//! Pure functions of their inputs. Every returned point keeps the center's
//! height; terrain search decides the real height later.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_1_SQRT_2, TAU};

/// Arrangement of spawn points around a center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPattern {
    /// `count` points evenly spaced on a circle of `radius`
    Ring,
    /// Four points on the axes at `radius`
    Cross,
    /// Four points on the diagonals, each at `radius` from the center
    DiagonalCross,
    /// Caller-supplied offsets; radius and count are ignored
    Explicit,
}

/// Spawn points for `pattern` around `center`
pub fn positions(
    center: DVec3,
    radius: f64,
    pattern: SpawnPattern,
    count: usize,
    offsets: &[DVec2],
) -> Vec<DVec3> {
    let at = |dx: f64, dz: f64| DVec3::new(center.x + dx, center.y, center.z + dz);

    match pattern {
        SpawnPattern::Ring => (0..count)
            .map(|i| {
                let angle = TAU * i as f64 / count as f64;
                at(radius * angle.cos(), radius * angle.sin())
            })
            .collect(),
        SpawnPattern::Cross => vec![
            at(radius, 0.0),
            at(-radius, 0.0),
            at(0.0, radius),
            at(0.0, -radius),
        ],
        SpawnPattern::DiagonalCross => {
            let d = radius * FRAC_1_SQRT_2;
            vec![at(d, d), at(-d, d), at(d, -d), at(-d, -d)]
        }
        SpawnPattern::Explicit => offsets.iter().map(|o| at(o.x, o.y)).collect(),
    }
}

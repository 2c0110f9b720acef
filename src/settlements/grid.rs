//! Sparse hash grid over settlement locations
//!
//! Cell size equals the clustering radius, so every record within that
//! radius of a point lives in the point's 3x3 cell neighbourhood.

use crate::core::types::{horizontal_distance, BlockPos, SettlementKey};
use ahash::AHashMap;

/// Sparse hash grid for neighbour queries in the horizontal plane
#[derive(Debug, Clone)]
pub struct SettlementGrid {
    cell_size: f64,
    cells: AHashMap<(i64, i64), Vec<(SettlementKey, BlockPos)>>,
}

impl SettlementGrid {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: BlockPos) -> (i64, i64) {
        (
            (pos.x as f64 / self.cell_size).floor() as i64,
            (pos.z as f64 / self.cell_size).floor() as i64,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, key: SettlementKey, pos: BlockPos) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((key, pos));
    }

    pub fn remove(&mut self, key: &SettlementKey, pos: BlockPos) {
        let coord = self.cell_coord(pos);
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|(k, _)| k != key);
            if cell.is_empty() {
                self.cells.remove(&coord);
            }
        }
    }

    /// Query all entries in neighbouring cells (3x3 neighbourhood)
    pub fn query_neighbors(&self, pos: BlockPos) -> impl Iterator<Item = &(SettlementKey, BlockPos)> + '_ {
        let (cx, cz) = self.cell_coord(pos);

        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dz| self.cells.get(&(cx + dx, cz + dz)).into_iter().flatten())
        })
    }

    /// Closest entry strictly within `radius` of `pos`
    ///
    /// `radius` must not exceed the cell size.
    pub fn nearest_within(&self, pos: BlockPos, radius: f64) -> Option<(&SettlementKey, f64)> {
        self.query_neighbors(pos)
            .map(|(key, at)| (key, horizontal_distance(pos, *at)))
            .filter(|(_, distance)| *distance < radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Rebuild grid from records
    pub fn rebuild(&mut self, entries: impl Iterator<Item = (SettlementKey, BlockPos)>) {
        self.clear();
        for (key, pos) in entries {
            self.insert(key, pos);
        }
    }
}

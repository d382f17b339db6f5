#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that commits a single cell to one tile by weighted sampling.

use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use tile_collapse_core::{
    CellCoord, Contradiction, TileCatalog, TileId, TileSet, TraceEvent, TraceSink,
};
use tile_collapse_grid::GridState;

/// Collapses cells to a single tile drawn in proportion to tile weights.
#[derive(Debug, Default)]
pub struct CollapseOperator {
    candidates: Vec<TileId>,
    weights: Vec<f64>,
}

impl CollapseOperator {
    /// Creates a new operator with empty sampling buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the candidates at `cell` with one tile sampled by weight.
    ///
    /// Candidates are weighed in ascending identifier order and a single
    /// cumulative-weight draw is taken from `rng`, so every collapse consumes
    /// the random stream exactly once. A cell with no candidates, or one
    /// outside the grid, is reported as a [`Contradiction`] and the grid is
    /// left untouched.
    pub fn collapse<R>(
        &mut self,
        grid: &mut GridState,
        catalog: &TileCatalog,
        cell: CellCoord,
        rng: &mut R,
        trace: &mut dyn TraceSink,
    ) -> Result<TileId, Contradiction>
    where
        R: Rng + ?Sized,
    {
        self.candidates.clear();
        self.weights.clear();

        if let Some(candidates) = grid.candidates(cell) {
            for tile in candidates.iter() {
                if let Some(weight) = catalog.weight(tile) {
                    self.candidates.push(tile);
                    self.weights.push(weight);
                }
            }
        }

        let Ok(distribution) = WeightedIndex::<f64>::new(&self.weights) else {
            trace.record(TraceEvent::Contradiction { cell });
            return Err(Contradiction { cell });
        };
        let chosen = self.candidates[distribution.sample(rng)];

        let _ = grid.replace(cell, TileSet::singleton(catalog.len(), chosen));
        trace.record(TraceEvent::CellCollapsed { cell, tile: chosen });
        Ok(chosen)
    }
}

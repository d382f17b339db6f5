#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that restores local consistency after a cell changes.
//!
//! Propagation is a breadth-first arc-consistency pass over the
//! 4-neighbourhood. Each dequeued cell restricts every in-bounds neighbour to
//! the union of what its own remaining candidates allow toward that
//! neighbour. Neighbours that shrink are queued in turn until nothing changes
//! or some cell runs out of candidates. Sets only ever shrink, so the pass
//! always terminates, and the fixed point it reaches does not depend on the
//! order directions are visited in.

use std::collections::VecDeque;

use tile_collapse_core::{
    CellCoord, Contradiction, Direction, TileCatalog, TileSet, TraceEvent, TraceSink,
};
use tile_collapse_grid::GridState;

/// Worklist-driven constraint propagation over a [`GridState`].
#[derive(Debug, Default)]
pub struct PropagationEngine {
    queue: VecDeque<CellCoord>,
}

impl PropagationEngine {
    /// Creates a new engine with an empty worklist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Propagates the consequences of a change at `origin`.
    ///
    /// Returns how many neighbour updates were written. On contradiction the
    /// pass stops immediately and the grid is left partially narrowed; callers
    /// are expected to discard it.
    pub fn propagate(
        &mut self,
        grid: &mut GridState,
        catalog: &TileCatalog,
        origin: CellCoord,
        trace: &mut dyn TraceSink,
    ) -> Result<usize, Contradiction> {
        self.queue.clear();
        self.queue.push_back(origin);
        self.drain(grid, catalog, trace)
    }

    /// Checks every cell against its neighbours until the whole grid is
    /// arc consistent.
    ///
    /// A grid that already reached a fixed point through [`Self::propagate`]
    /// is left untouched and produces no trace events. Cells that were never
    /// propagated from, such as the singletons of a one-tile catalog, are
    /// checked here as well.
    pub fn settle(
        &mut self,
        grid: &mut GridState,
        catalog: &TileCatalog,
        trace: &mut dyn TraceSink,
    ) -> Result<usize, Contradiction> {
        self.queue.clear();
        self.queue.extend(grid.iter().map(|(cell, _)| cell));
        self.drain(grid, catalog, trace)
    }

    fn drain(
        &mut self,
        grid: &mut GridState,
        catalog: &TileCatalog,
        trace: &mut dyn TraceSink,
    ) -> Result<usize, Contradiction> {
        let mut updates = 0;

        while let Some(cell) = self.queue.pop_front() {
            let Some(current) = grid.candidates(cell).cloned() else {
                continue;
            };

            for (direction, neighbor) in grid.neighbors(cell) {
                let allowed = allowed_toward(catalog, &current, direction);
                let Some(before) = grid.candidates(neighbor) else {
                    continue;
                };

                let after = before.intersection(&allowed);
                if after.is_empty() {
                    self.queue.clear();
                    trace.record(TraceEvent::Contradiction { cell: neighbor });
                    return Err(Contradiction { cell: neighbor });
                }

                // The intersection is a subset, so equal sizes mean no change.
                if after.len() == before.len() {
                    continue;
                }

                if let Some(before) = grid.replace(neighbor, after.clone()) {
                    trace.record(TraceEvent::CellNarrowed {
                        cell: neighbor,
                        before,
                        after,
                    });
                }
                updates += 1;
                self.queue.push_back(neighbor);
            }
        }

        Ok(updates)
    }
}

/// Union of the rules every candidate in `current` declares toward
/// `direction`.
fn allowed_toward(catalog: &TileCatalog, current: &TileSet, direction: Direction) -> TileSet {
    let mut allowed = TileSet::empty(catalog.len());
    for tile in current.iter() {
        if let Some(rule) = catalog.allowed(tile, direction) {
            allowed.union_with(rule);
        }
    }
    allowed
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks the next cell to collapse.

use tile_collapse_core::CellCoord;
use tile_collapse_grid::GridState;

/// Selects the open cell with the fewest remaining candidates.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntropySelector;

impl EntropySelector {
    /// Returns the uncollapsed cell with the smallest candidate count.
    ///
    /// Cells are scanned row by row, left to right, and the first minimum wins
    /// so identical grids always yield the same cell. Singleton cells are
    /// already resolved and empty cells are contradictions, so neither is ever
    /// returned. `None` means no cell remains open.
    #[must_use]
    pub fn select(&self, grid: &GridState) -> Option<CellCoord> {
        let mut best: Option<(usize, CellCoord)> = None;

        for (cell, candidates) in grid.iter() {
            let entropy = candidates.len();
            if entropy <= 1 {
                continue;
            }

            match best {
                Some((lowest, _)) if lowest <= entropy => {}
                _ => best = Some((entropy, cell)),
            }

            if entropy == 2 {
                break;
            }
        }

        best.map(|(_, cell)| cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_collapse_core::{TileCatalog, TileDefinition, TileId, TileSet};

    fn catalog() -> TileCatalog {
        TileCatalog::new((0..4).map(|index| TileDefinition::new(format!("t{index}"), 1.0)))
            .expect("valid catalog")
    }

    fn set_of(members: &[u32]) -> TileSet {
        let mut set = TileSet::empty(4);
        for member in members {
            let _ = set.insert(TileId::new(*member));
        }
        set
    }

    #[test]
    fn fresh_grid_selects_origin() {
        let grid = GridState::new(3, 3, &catalog());
        assert_eq!(EntropySelector.select(&grid), Some(CellCoord::new(0, 0)));
    }

    #[test]
    fn picks_lowest_entropy_first_in_row_major_order() {
        let mut grid = GridState::new(3, 3, &catalog());
        let _ = grid.replace(CellCoord::new(2, 2), set_of(&[0, 1, 2]));
        let _ = grid.replace(CellCoord::new(1, 1), set_of(&[1, 3, 2]));
        let _ = grid.replace(CellCoord::new(0, 2), set_of(&[0, 1, 3]));

        assert_eq!(EntropySelector.select(&grid), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn skips_resolved_and_empty_cells() {
        let mut grid = GridState::new(2, 2, &catalog());
        let _ = grid.replace(CellCoord::new(0, 0), set_of(&[2]));
        let _ = grid.replace(CellCoord::new(1, 0), set_of(&[]));
        let _ = grid.replace(CellCoord::new(1, 1), set_of(&[0, 3]));

        assert_eq!(EntropySelector.select(&grid), Some(CellCoord::new(1, 1)));
    }

    #[test]
    fn resolved_grid_selects_nothing() {
        let mut grid = GridState::new(2, 1, &catalog());
        let _ = grid.replace(CellCoord::new(0, 0), set_of(&[0]));
        let _ = grid.replace(CellCoord::new(1, 0), set_of(&[3]));

        assert_eq!(EntropySelector.select(&grid), None);
    }

    #[test]
    fn equal_entropy_profiles_select_the_same_cell() {
        let mut first = GridState::new(3, 2, &catalog());
        let mut second = GridState::new(3, 2, &catalog());
        let _ = first.replace(CellCoord::new(2, 0), set_of(&[0, 1]));
        let _ = first.replace(CellCoord::new(1, 1), set_of(&[2, 3]));
        let _ = second.replace(CellCoord::new(2, 0), set_of(&[1, 3]));
        let _ = second.replace(CellCoord::new(1, 1), set_of(&[0, 2]));

        let selected = EntropySelector.select(&first);
        assert_eq!(selected, Some(CellCoord::new(2, 0)));
        assert_eq!(selected, EntropySelector.select(&second));
    }
}

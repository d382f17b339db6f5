#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative candidate grid owned by a single solving attempt.
//!
//! [`GridState`] stores one [`TileSet`] per cell in row-major order. Only the
//! collapse and propagation systems mutate it; the run controller discards it
//! wholesale through [`GridState::reset`] once an attempt contradicts. A grid
//! whose every cell is a singleton converts into the immutable [`TileMap`]
//! handed back to callers.

use tile_collapse_core::{CellCoord, Direction, TileCatalog, TileId, TileSet};

/// Width by height array of candidate sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridState {
    width: u32,
    height: u32,
    cells: Vec<TileSet>,
}

impl GridState {
    /// Creates a grid where every cell may still hold any catalog tile.
    #[must_use]
    pub fn new(width: u32, height: u32, catalog: &TileCatalog) -> Self {
        Self {
            width,
            height,
            cells: vec![catalog.all_tiles(); cell_count(width, height)],
        }
    }

    /// Reopens every cell to the full catalog, keeping the allocation.
    pub fn reset(&mut self, catalog: &TileCatalog) {
        let full = catalog.all_tiles();
        self.cells.clear();
        self.cells.resize(cell_count(self.width, self.height), full);
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Candidates still possible at `cell`, if it lies inside the grid.
    #[must_use]
    pub fn candidates(&self, cell: CellCoord) -> Option<&TileSet> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Overwrites the candidates at `cell`, returning the previous set.
    ///
    /// Returns `None` and leaves the grid untouched when `cell` is out of
    /// bounds.
    pub fn replace(&mut self, cell: CellCoord, candidates: TileSet) -> Option<TileSet> {
        let index = self.index(cell)?;
        let slot = self.cells.get_mut(index)?;
        Some(std::mem::replace(slot, candidates))
    }

    /// In-bounds neighbours of `cell` tagged with the direction leading to
    /// them, visited north, east, south, west.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = (Direction, CellCoord)> {
        let (width, height) = (self.width, self.height);
        Direction::ALL.into_iter().filter_map(move |direction| {
            cell.step(direction, width, height)
                .map(|neighbor| (direction, neighbor))
        })
    }

    /// Cells and their candidates in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &TileSet)> + '_ {
        let width = usize::try_from(self.width).unwrap_or(usize::MAX).max(1);
        self.cells.iter().enumerate().map(move |(index, candidates)| {
            let column = u32::try_from(index % width).unwrap_or(u32::MAX);
            let row = u32::try_from(index / width).unwrap_or(u32::MAX);
            (CellCoord::new(column, row), candidates)
        })
    }

    /// Reports whether every cell holds exactly one candidate.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cells.iter().all(|candidates| candidates.len() == 1)
    }

    /// Converts a fully resolved grid into a [`TileMap`].
    #[must_use]
    pub fn resolve(&self) -> Option<TileMap> {
        let tiles = self
            .cells
            .iter()
            .map(TileSet::single)
            .collect::<Option<Vec<TileId>>>()?;

        Some(TileMap {
            width: self.width,
            height: self.height,
            tiles,
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.width && cell.row() < self.height {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.width).ok()?;
            row.checked_mul(width)?.checked_add(column)
        } else {
            None
        }
    }
}

fn cell_count(width: u32, height: u32) -> usize {
    let width = usize::try_from(width).unwrap_or(0);
    let height = usize::try_from(height).unwrap_or(0);
    width.checked_mul(height).unwrap_or(0)
}

/// Fully resolved grid of tile identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TileMap {
    width: u32,
    height: u32,
    tiles: Vec<TileId>,
}

impl TileMap {
    /// Number of columns in the map.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the map.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Tile placed at `cell`, if it lies inside the map.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileId> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        self.tiles.get(row * width + column).copied()
    }

    /// Tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[TileId] {
        &self.tiles
    }

    /// Rows of the map from top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[TileId]> {
        let width = usize::try_from(self.width).unwrap_or(usize::MAX).max(1);
        self.tiles.chunks(width)
    }

    /// Tile names arranged as rows of columns.
    #[must_use]
    pub fn names(&self, catalog: &TileCatalog) -> Vec<Vec<String>> {
        self.rows()
            .map(|row| {
                row.iter()
                    .map(|tile| catalog.name(*tile).unwrap_or("?").to_owned())
                    .collect()
            })
            .collect()
    }
}

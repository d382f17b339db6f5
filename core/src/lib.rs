#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tile collapse workspace.
//!
//! This crate defines the vocabulary every other crate speaks. Tiles are
//! declared through [`TileDefinition`] values and validated once into an
//! immutable [`TileCatalog`]. Grid cells store [`TileSet`] candidate sets, and
//! systems narrowing those sets report what they did as a stream of
//! [`TraceEvent`] values pushed into any [`TraceSink`]. Attempt-scoped
//! failures are ordinary [`Contradiction`] values rather than panics.

use std::{collections::HashMap, fmt};

use bitvec::prelude::*;
use serde::Deserialize;
use thiserror::Error;

/// Cardinal directions linking a cell to its four neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Toward decreasing row indices.
    North,
    /// Toward increasing column indices.
    East,
    /// Toward increasing row indices.
    South,
    /// Toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in the order neighbours are visited.
    pub const ALL: [Direction; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Direction pointing the other way.
    ///
    /// Only used for coordinate arithmetic. Adjacency rules are never mirrored
    /// through this value.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Column and row delta of a single step in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Stable slot of the direction inside per-direction arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::North => 0,
            Self::East => 1,
            Self::South => 2,
            Self::West => 3,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(label)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Neighbouring cell one step toward `direction`, if it lies inside a
    /// `width` by `height` grid.
    #[must_use]
    pub fn step(self, direction: Direction, width: u32, height: u32) -> Option<CellCoord> {
        let column = match direction {
            Direction::East => self.column.checked_add(1)?,
            Direction::West => self.column.checked_sub(1)?,
            Direction::North | Direction::South => self.column,
        };
        let row = match direction {
            Direction::South => self.row.checked_add(1)?,
            Direction::North => self.row.checked_sub(1)?,
            Direction::East | Direction::West => self.row,
        };

        if column < width && row < height {
            Some(CellCoord::new(column, row))
        } else {
            None
        }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Dense identifier assigned to a tile in catalog declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the tile inside catalog-sized tables.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    // Catalogs reject more than `u32::MAX` tiles, so set indices always fit.
    const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

/// Set of tile identifiers still possible for a cell.
///
/// The set has a fixed capacity equal to the number of tiles in the catalog
/// it was built for and iterates in ascending [`TileId`] order. Membership is
/// all it records; sampling weights live in the catalog.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TileSet {
    bits: BitVec,
}

impl TileSet {
    /// Creates a set with no members.
    #[must_use]
    pub fn empty(capacity: usize) -> Self {
        Self {
            bits: bitvec![0; capacity],
        }
    }

    /// Creates a set containing every tile below `capacity`.
    #[must_use]
    pub fn full(capacity: usize) -> Self {
        Self {
            bits: bitvec![1; capacity],
        }
    }

    /// Creates a set containing exactly `tile`.
    #[must_use]
    pub fn singleton(capacity: usize, tile: TileId) -> Self {
        let mut set = Self::empty(capacity);
        let _ = set.insert(tile);
        set
    }

    /// Number of tiles the set can describe.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Adds `tile`, returning `true` when it was not already present.
    ///
    /// Tiles outside the capacity are ignored.
    pub fn insert(&mut self, tile: TileId) -> bool {
        if tile.index() >= self.bits.len() {
            return false;
        }
        !self.bits.replace(tile.index(), true)
    }

    /// Reports whether `tile` is a member.
    #[must_use]
    pub fn contains(&self, tile: TileId) -> bool {
        self.bits.get(tile.index()).map_or(false, |bit| *bit)
    }

    /// Number of members, the cell's entropy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.count_ones()
    }

    /// Reports whether the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Sole member of a singleton set.
    #[must_use]
    pub fn single(&self) -> Option<TileId> {
        if self.len() == 1 {
            self.bits.first_one().map(TileId::from_index)
        } else {
            None
        }
    }

    /// Iterates members in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = TileId> + '_ {
        self.bits.iter_ones().map(TileId::from_index)
    }

    /// Adds every member of `other` to this set.
    pub fn union_with(&mut self, other: &TileSet) {
        self.bits |= other.bits.as_bitslice();
    }

    /// Members present in both sets.
    #[must_use]
    pub fn intersection(&self, other: &TileSet) -> TileSet {
        let mut bits = self.bits.clone();
        bits &= other.bits.as_bitslice();
        Self { bits }
    }

    /// Reports whether every member of this set also belongs to `other`.
    #[must_use]
    pub fn is_subset(&self, other: &TileSet) -> bool {
        self.iter().all(|tile| other.contains(tile))
    }
}

impl fmt::Debug for TileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|tile| tile.get())).finish()
    }
}

/// Neighbour names permitted in each direction, as declared by a tile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdjacencyRules {
    /// Tiles allowed directly above.
    #[serde(default)]
    pub north: Vec<String>,
    /// Tiles allowed directly to the right.
    #[serde(default)]
    pub east: Vec<String>,
    /// Tiles allowed directly below.
    #[serde(default)]
    pub south: Vec<String>,
    /// Tiles allowed directly to the left.
    #[serde(default)]
    pub west: Vec<String>,
}

impl AdjacencyRules {
    /// Names allowed toward `direction`.
    #[must_use]
    pub fn get(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::North => &self.north,
            Direction::East => &self.east,
            Direction::South => &self.south,
            Direction::West => &self.west,
        }
    }

    fn get_mut(&mut self, direction: Direction) -> &mut Vec<String> {
        match direction {
            Direction::North => &mut self.north,
            Direction::East => &mut self.east,
            Direction::South => &mut self.south,
            Direction::West => &mut self.west,
        }
    }
}

/// Unvalidated declaration of a single tile, as read from configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TileDefinition {
    /// Unique name the tile is referred to by.
    pub name: String,
    /// Relative selection weight; must be finite and positive.
    pub weight: f64,
    /// Character used by text renderers. Defaults to the uppercase initial.
    #[serde(default)]
    pub glyph: Option<char>,
    /// Neighbours permitted in each direction.
    #[serde(default)]
    pub rules: AdjacencyRules,
}

impl TileDefinition {
    /// Starts a definition with no permitted neighbours.
    #[must_use]
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            glyph: None,
            rules: AdjacencyRules::default(),
        }
    }

    /// Permits `neighbors` toward `direction`.
    #[must_use]
    pub fn allow<I, S>(mut self, direction: Direction, neighbors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .get_mut(direction)
            .extend(neighbors.into_iter().map(Into::into));
        self
    }

    /// Permits `neighbors` toward every direction.
    #[must_use]
    pub fn allow_all<I, S>(mut self, neighbors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let neighbors: Vec<String> = neighbors.into_iter().map(Into::into).collect();
        for direction in Direction::ALL {
            self.rules.get_mut(direction).extend(neighbors.iter().cloned());
        }
        self
    }

    /// Overrides the glyph used when rendering the tile.
    #[must_use]
    pub fn with_glyph(mut self, glyph: char) -> Self {
        self.glyph = Some(glyph);
        self
    }
}

/// Reasons a set of tile definitions cannot form a catalog.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CatalogError {
    /// No tiles were declared.
    #[error("tile catalog must declare at least one tile")]
    Empty,
    /// More tiles were declared than identifiers can address.
    #[error("tile catalog declares {count} tiles, more than identifiers can address")]
    TooManyTiles {
        /// Number of declared tiles.
        count: usize,
    },
    /// The same name was declared twice.
    #[error("tile `{name}` is declared more than once")]
    DuplicateTile {
        /// Name that appeared twice.
        name: String,
    },
    /// A weight was zero, negative, or not finite.
    #[error("tile `{tile}` has weight {weight}, weights must be positive")]
    NonPositiveWeight {
        /// Tile carrying the invalid weight.
        tile: String,
        /// Rejected weight.
        weight: f64,
    },
    /// Every weight was valid on its own but their sum is not finite.
    #[error("tile weights sum to {total}, the total weight must be finite")]
    WeightOverflow {
        /// Sum of all declared weights.
        total: f64,
    },
    /// An adjacency rule named a tile that was never declared.
    #[error("tile `{tile}` allows unknown tile `{neighbor}` toward {direction}")]
    UnknownNeighbor {
        /// Tile whose rule is invalid.
        tile: String,
        /// Direction of the offending rule.
        direction: Direction,
        /// Undeclared name referenced by the rule.
        neighbor: String,
    },
}

/// Validated tile stored inside a [`TileCatalog`].
#[derive(Clone, Debug)]
pub struct Tile {
    name: String,
    weight: f64,
    glyph: char,
    adjacency: [TileSet; 4],
}

impl Tile {
    /// Name the tile was declared with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative selection weight, always positive.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Character used by text renderers.
    #[must_use]
    pub const fn glyph(&self) -> char {
        self.glyph
    }

    /// Tiles permitted as this tile's neighbour toward `direction`.
    #[must_use]
    pub fn allowed(&self, direction: Direction) -> &TileSet {
        &self.adjacency[direction.index()]
    }
}

/// Immutable, validated description of every tile a grid may contain.
///
/// Adjacency rules are kept exactly as declared. A tile allowing `b` to its
/// east says nothing about what `b` allows to its west.
#[derive(Clone, Debug)]
pub struct TileCatalog {
    tiles: Vec<Tile>,
    ids: HashMap<String, TileId>,
}

impl TileCatalog {
    /// Validates `definitions` and resolves every rule to tile identifiers.
    ///
    /// Identifiers are assigned in declaration order.
    pub fn new<I>(definitions: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = TileDefinition>,
    {
        let definitions: Vec<TileDefinition> = definitions.into_iter().collect();
        if definitions.is_empty() {
            return Err(CatalogError::Empty);
        }
        if u32::try_from(definitions.len()).is_err() {
            return Err(CatalogError::TooManyTiles {
                count: definitions.len(),
            });
        }

        let capacity = definitions.len();
        let mut ids = HashMap::with_capacity(capacity);
        for (index, definition) in definitions.iter().enumerate() {
            if ids
                .insert(definition.name.clone(), TileId::from_index(index))
                .is_some()
            {
                return Err(CatalogError::DuplicateTile {
                    name: definition.name.clone(),
                });
            }
        }

        let mut tiles = Vec::with_capacity(capacity);
        for definition in definitions {
            if !definition.weight.is_finite() || definition.weight <= 0.0 {
                return Err(CatalogError::NonPositiveWeight {
                    tile: definition.name,
                    weight: definition.weight,
                });
            }

            let mut adjacency: [TileSet; 4] = std::array::from_fn(|_| TileSet::empty(capacity));
            for direction in Direction::ALL {
                let allowed = &mut adjacency[direction.index()];
                for neighbor in definition.rules.get(direction) {
                    let Some(&id) = ids.get(neighbor) else {
                        return Err(CatalogError::UnknownNeighbor {
                            tile: definition.name.clone(),
                            direction,
                            neighbor: neighbor.clone(),
                        });
                    };
                    let _ = allowed.insert(id);
                }
            }

            let glyph = definition
                .glyph
                .or_else(|| {
                    definition
                        .name
                        .chars()
                        .next()
                        .and_then(|initial| initial.to_uppercase().next())
                })
                .unwrap_or('?');

            tiles.push(Tile {
                name: definition.name,
                weight: definition.weight,
                glyph,
                adjacency,
            });
        }

        // Sampling any subset of candidates relies on the full sum being finite.
        let total: f64 = tiles.iter().map(Tile::weight).sum();
        if !total.is_finite() {
            return Err(CatalogError::WeightOverflow { total });
        }

        Ok(Self { tiles, ids })
    }

    /// Number of tiles in the catalog, never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always `false`; construction rejects empty catalogs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Identifiers of every tile in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = TileId> {
        (0..self.tiles.len()).map(TileId::from_index)
    }

    /// Resolves a tile name to its identifier.
    #[must_use]
    pub fn id(&self, name: &str) -> Option<TileId> {
        self.ids.get(name).copied()
    }

    /// Looks up the tile behind `id`.
    #[must_use]
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.index())
    }

    /// Name of the tile behind `id`.
    #[must_use]
    pub fn name(&self, id: TileId) -> Option<&str> {
        self.tile(id).map(Tile::name)
    }

    /// Selection weight of the tile behind `id`.
    #[must_use]
    pub fn weight(&self, id: TileId) -> Option<f64> {
        self.tile(id).map(Tile::weight)
    }

    /// Render glyph of the tile behind `id`.
    #[must_use]
    pub fn glyph(&self, id: TileId) -> Option<char> {
        self.tile(id).map(Tile::glyph)
    }

    /// Tiles `id` permits as its neighbour toward `direction`.
    #[must_use]
    pub fn allowed(&self, id: TileId, direction: Direction) -> Option<&TileSet> {
        self.tile(id).map(|tile| tile.allowed(direction))
    }

    /// Candidate set holding every tile, the state of a freshly reset cell.
    #[must_use]
    pub fn all_tiles(&self) -> TileSet {
        TileSet::full(self.tiles.len())
    }

    /// Formats the members of `set` by name, for diagnostics.
    #[must_use]
    pub fn describe(&self, set: &TileSet) -> String {
        let names: Vec<&str> = set.iter().filter_map(|id| self.name(id)).collect();
        format!("[{}]", names.join(", "))
    }
}

/// Signals that a cell ran out of candidates during the current attempt.
///
/// Returned in the error arm by the collapse and propagation systems. The
/// grid that produced it is inconsistent and must be discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
#[error("contradiction at cell {cell}")]
pub struct Contradiction {
    /// Cell whose candidate set became empty.
    pub cell: CellCoord,
}

/// Step-level events emitted while a grid is being solved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceEvent {
    /// A fresh attempt began with every cell fully open.
    AttemptStarted {
        /// One-based attempt number.
        attempt: u64,
    },
    /// A cell was committed to a single tile.
    CellCollapsed {
        /// Cell that was collapsed.
        cell: CellCoord,
        /// Tile the cell was committed to.
        tile: TileId,
    },
    /// Propagation removed candidates from a cell.
    CellNarrowed {
        /// Cell whose candidates shrank.
        cell: CellCoord,
        /// Candidates before the update.
        before: TileSet,
        /// Candidates after the update.
        after: TileSet,
    },
    /// A cell ran out of candidates.
    Contradiction {
        /// Cell whose candidate set became empty.
        cell: CellCoord,
    },
    /// The attempt resolved every cell.
    AttemptSucceeded {
        /// One-based attempt number.
        attempt: u64,
    },
    /// The attempt was abandoned after a contradiction.
    AttemptFailed {
        /// One-based attempt number.
        attempt: u64,
        /// Cell that contradicted.
        cell: CellCoord,
    },
}

/// Receiver for [`TraceEvent`] values.
pub trait TraceSink {
    /// Records a single event.
    fn record(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn record(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// Sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardTrace;

impl TraceSink for DiscardTrace {
    fn record(&mut self, _event: TraceEvent) {}
}

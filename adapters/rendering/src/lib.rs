#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Text presentation of resolved tile maps.
//!
//! Renderers only read a [`TileMap`] and its [`TileCatalog`]; they never
//! influence generation.

use std::fmt::Write as _;

use tile_collapse_core::TileCatalog;
use tile_collapse_grid::TileMap;

/// Glyph drawn for a tile the catalog does not know.
pub const UNKNOWN_GLYPH: char = '?';

/// Renders one line per row with one glyph per cell separated by spaces.
#[must_use]
pub fn render_glyphs(map: &TileMap, catalog: &TileCatalog) -> String {
    let mut output = String::new();
    for row in map.rows() {
        let line = row
            .iter()
            .map(|tile| catalog.glyph(*tile).unwrap_or(UNKNOWN_GLYPH).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        output.push_str(&line);
        output.push('\n');
    }
    output
}

/// Renders full tile names in left-aligned columns padded to the longest
/// name in the map.
#[must_use]
pub fn render_names(map: &TileMap, catalog: &TileCatalog) -> String {
    let names = map.names(catalog);
    let column_width = names
        .iter()
        .flatten()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(0);

    let mut output = String::new();
    for row in &names {
        let mut line = String::new();
        for (index, name) in row.iter().enumerate() {
            if index + 1 == row.len() {
                line.push_str(name);
            } else {
                let _ = write!(line, "{name:<column_width$} ");
            }
        }
        output.push_str(&line);
        output.push('\n');
    }
    output
}

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use tile_collapse_core::TileDefinition;

/// Terrain catalog used when no catalog file is supplied.
///
/// Sand is the only tile whose rules differ by direction: water may lie
/// below it but never above or beside it.
pub(crate) const DEFAULT_CATALOG: &str = r#"
[[tiles]]
name = "grass"
weight = 5.0

[tiles.rules]
north = ["grass", "forest", "sand"]
east = ["grass", "forest", "sand"]
south = ["grass", "forest", "sand"]
west = ["grass", "forest", "sand"]

[[tiles]]
name = "forest"
weight = 2.0

[tiles.rules]
north = ["forest", "grass"]
east = ["forest", "grass"]
south = ["forest", "grass"]
west = ["forest", "grass"]

[[tiles]]
name = "sand"
weight = 3.0

[tiles.rules]
north = ["sand", "grass"]
east = ["sand", "grass"]
south = ["sand", "water"]
west = ["sand", "grass"]

[[tiles]]
name = "water"
weight = 1.0

[tiles.rules]
north = ["water", "sand"]
east = ["water", "sand"]
south = ["water", "sand"]
west = ["water", "sand"]
"#;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    tiles: Vec<TileDefinition>,
}

/// Definitions of the built-in terrain catalog.
pub(crate) fn builtin() -> Result<Vec<TileDefinition>> {
    parse(DEFAULT_CATALOG).context("built-in tile catalog is malformed")
}

/// Reads tile definitions from the TOML file at `path`.
pub(crate) fn load(path: &Path) -> Result<Vec<TileDefinition>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read tile catalog at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid tile catalog at {}", path.display()))
}

fn parse(contents: &str) -> Result<Vec<TileDefinition>> {
    let file: CatalogFile =
        toml::from_str(contents).context("failed to parse tile catalog toml contents")?;
    Ok(file.tiles)
}

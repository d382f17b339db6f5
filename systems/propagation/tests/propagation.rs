use tile_collapse_core::{
    CellCoord, Contradiction, DiscardTrace, Direction, TileCatalog, TileDefinition, TileId,
    TileSet, TraceEvent,
};
use tile_collapse_grid::GridState;
use tile_collapse_system_propagation::PropagationEngine;

fn terrain() -> TileCatalog {
    TileCatalog::new(vec![
        TileDefinition::new("water", 1.0).allow_all(["water", "sand"]),
        TileDefinition::new("sand", 3.0)
            .allow(Direction::North, ["sand", "grass"])
            .allow(Direction::East, ["sand", "grass"])
            .allow(Direction::South, ["sand", "water"])
            .allow(Direction::West, ["sand", "grass"]),
        TileDefinition::new("grass", 5.0).allow_all(["grass", "forest", "sand"]),
        TileDefinition::new("forest", 2.0).allow_all(["forest", "grass"]),
    ])
    .expect("valid catalog")
}

fn only(catalog: &TileCatalog, name: &str) -> TileSet {
    TileSet::singleton(catalog.len(), catalog.id(name).expect("declared tile"))
}

fn set_of(catalog: &TileCatalog, names: &[&str]) -> TileSet {
    let mut set = TileSet::empty(catalog.len());
    for name in names {
        let _ = set.insert(catalog.id(name).expect("declared tile"));
    }
    set
}

#[test]
fn water_prunes_land_from_its_eastern_neighbor() {
    let catalog = terrain();
    let mut grid = GridState::new(2, 1, &catalog);
    let origin = CellCoord::new(0, 0);
    let east = CellCoord::new(1, 0);
    let _ = grid.replace(origin, only(&catalog, "water"));
    let mut trace = Vec::new();

    let updates = PropagationEngine::new()
        .propagate(&mut grid, &catalog, origin, &mut trace)
        .expect("consistent");

    assert_eq!(updates, 1);
    assert_eq!(
        grid.candidates(east),
        Some(&set_of(&catalog, &["water", "sand"]))
    );
    assert_eq!(
        trace,
        vec![TraceEvent::CellNarrowed {
            cell: east,
            before: catalog.all_tiles(),
            after: set_of(&catalog, &["water", "sand"]),
        }]
    );
}

#[test]
fn empty_rule_contradicts_at_the_neighbor() {
    let catalog = TileCatalog::new(vec![
        TileDefinition::new("island", 1.0)
            .allow(Direction::North, ["island", "reef"])
            .allow(Direction::South, ["island", "reef"])
            .allow(Direction::West, ["island", "reef"]),
        TileDefinition::new("reef", 1.0).allow_all(["island", "reef"]),
    ])
    .expect("valid catalog");
    let mut grid = GridState::new(2, 1, &catalog);
    let origin = CellCoord::new(0, 0);
    let _ = grid.replace(origin, only(&catalog, "island"));
    let mut trace = Vec::new();

    let outcome = PropagationEngine::new().propagate(&mut grid, &catalog, origin, &mut trace);

    let east = CellCoord::new(1, 0);
    assert_eq!(outcome, Err(Contradiction { cell: east }));
    assert_eq!(trace.last(), Some(&TraceEvent::Contradiction { cell: east }));
}

#[test]
fn narrowing_spreads_across_the_grid() {
    let catalog = TileCatalog::new(vec![
        TileDefinition::new("a", 1.0).allow_all(["a"]),
        TileDefinition::new("b", 1.0).allow_all(["b"]),
    ])
    .expect("valid catalog");
    let mut grid = GridState::new(3, 3, &catalog);
    let center = CellCoord::new(1, 1);
    let _ = grid.replace(center, only(&catalog, "a"));

    let updates = PropagationEngine::new()
        .propagate(&mut grid, &catalog, center, &mut DiscardTrace)
        .expect("consistent");

    assert_eq!(updates, 8, "every other cell narrows exactly once");
    let map = grid.resolve().expect("every cell forced");
    assert!(map.tiles().iter().all(|tile| *tile == TileId::new(0)));
}

#[test]
fn only_the_source_tiles_rule_is_consulted() {
    // `right` refuses `left` on its west side, but `left` allows `right` to
    // its east. Propagating from `left` must not mirror `right`'s rule.
    let catalog = TileCatalog::new(vec![
        TileDefinition::new("left", 1.0).allow_all(["left", "right"]),
        TileDefinition::new("right", 1.0)
            .allow(Direction::North, ["left", "right"])
            .allow(Direction::East, ["left", "right"])
            .allow(Direction::South, ["left", "right"])
            .allow(Direction::West, ["right"]),
    ])
    .expect("valid catalog");
    let mut grid = GridState::new(2, 1, &catalog);
    let origin = CellCoord::new(0, 0);
    let _ = grid.replace(origin, only(&catalog, "left"));

    let updates = PropagationEngine::new()
        .propagate(&mut grid, &catalog, origin, &mut DiscardTrace)
        .expect("consistent");

    assert_eq!(updates, 0);
    assert_eq!(grid.candidates(CellCoord::new(1, 0)), Some(&catalog.all_tiles()));
}

#[test]
fn candidate_sets_only_shrink() {
    let catalog = terrain();
    let mut grid = GridState::new(4, 4, &catalog);
    let mut engine = PropagationEngine::new();
    let mut trace = Vec::new();

    for (cell, tile) in [
        (CellCoord::new(1, 1), "grass"),
        (CellCoord::new(3, 3), "water"),
        (CellCoord::new(0, 0), "forest"),
    ] {
        let _ = grid.replace(cell, only(&catalog, tile));
        let _ = engine
            .propagate(&mut grid, &catalog, cell, &mut trace)
            .expect("consistent");
    }

    assert!(!trace.is_empty());
    for event in &trace {
        match event {
            TraceEvent::CellNarrowed { before, after, .. } => {
                assert!(after.is_subset(before), "candidates grew: {event:?}");
                assert!(after.len() < before.len(), "no-op update recorded: {event:?}");
            }
            other => panic!("unexpected event during propagation: {other:?}"),
        }
    }
}

#[test]
fn fixed_point_is_idempotent() {
    let catalog = terrain();
    let mut grid = GridState::new(3, 3, &catalog);
    let center = CellCoord::new(1, 1);
    let _ = grid.replace(center, only(&catalog, "grass"));
    let mut engine = PropagationEngine::new();

    let first = engine
        .propagate(&mut grid, &catalog, center, &mut DiscardTrace)
        .expect("consistent");
    assert!(first > 0);
    let settled = grid.clone();

    let mut trace = Vec::new();
    let second = engine
        .propagate(&mut grid, &catalog, center, &mut trace)
        .expect("consistent");

    assert_eq!(second, 0);
    assert!(trace.is_empty());
    assert_eq!(grid, settled);
}

#[test]
fn origin_outside_the_grid_is_ignored() {
    let catalog = terrain();
    let mut grid = GridState::new(2, 2, &catalog);
    let untouched = grid.clone();

    let updates = PropagationEngine::new()
        .propagate(&mut grid, &catalog, CellCoord::new(7, 7), &mut DiscardTrace)
        .expect("nothing to check");

    assert_eq!(updates, 0);
    assert_eq!(grid, untouched);
}

#[test]
fn settle_checks_cells_that_were_never_propagated() {
    let catalog =
        TileCatalog::new(vec![TileDefinition::new("rock", 1.0)]).expect("valid catalog");
    let mut grid = GridState::new(2, 1, &catalog);
    let mut trace = Vec::new();

    let outcome = PropagationEngine::new().settle(&mut grid, &catalog, &mut trace);

    let east = CellCoord::new(1, 0);
    assert_eq!(outcome, Err(Contradiction { cell: east }));
    assert_eq!(trace, vec![TraceEvent::Contradiction { cell: east }]);
}

#[test]
fn settle_leaves_a_fixed_point_untouched() {
    let catalog = terrain();
    let mut grid = GridState::new(3, 3, &catalog);
    let center = CellCoord::new(1, 1);
    let _ = grid.replace(center, only(&catalog, "water"));
    let mut engine = PropagationEngine::new();
    let _ = engine
        .propagate(&mut grid, &catalog, center, &mut DiscardTrace)
        .expect("consistent");
    let settled = grid.clone();
    let mut trace = Vec::new();

    let updates = engine
        .settle(&mut grid, &catalog, &mut trace)
        .expect("consistent");

    assert_eq!(updates, 0);
    assert!(trace.is_empty());
    assert_eq!(grid, settled);
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Run controller that drives solving attempts to a resolved tile map.
//!
//! Every attempt starts from a fully open grid and loops select, collapse,
//! propagate until the selector finds nothing left to resolve or a
//! contradiction abandons the attempt. A final pass over every cell confirms
//! the grid is arc consistent before it is accepted. Abandoned attempts are
//! retried from scratch with the same random stream until the retry budget is
//! spent. No choice is ever undone inside an attempt.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tile_collapse_core::{
    CatalogError, CellCoord, Contradiction, TileCatalog, TileDefinition, TraceEvent, TraceSink,
};
use tile_collapse_grid::{GridState, TileMap};
use tile_collapse_system_collapse::CollapseOperator;
use tile_collapse_system_entropy::EntropySelector;
use tile_collapse_system_propagation::PropagationEngine;

/// Configuration parameters required to construct the run controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    width: u32,
    height: u32,
    max_retries: u32,
}

impl Config {
    /// Creates a new configuration for a `width` by `height` grid.
    ///
    /// A run makes at most `max_retries + 1` attempts, counted as `u64` so
    /// the full `u32` budget is reachable.
    #[must_use]
    pub const fn new(width: u32, height: u32, max_retries: u32) -> Self {
        Self {
            width,
            height,
            max_retries,
        }
    }

    /// Number of columns to generate.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows to generate.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Restarts allowed after the first attempt contradicts.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Checks that the grid has at least one cell and is addressable.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let cells = usize::try_from(self.width)
            .ok()
            .zip(usize::try_from(self.height).ok())
            .and_then(|(width, height)| width.checked_mul(height));

        match cells {
            Some(count) if count > 0 => Ok(()),
            _ => Err(GenerationError::InvalidDimensions {
                width: self.width,
                height: self.height,
            }),
        }
    }
}

/// Terminal reasons a run produces no map.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// The tile definitions could not form a catalog.
    #[error("invalid tile catalog: {0}")]
    InvalidCatalog(#[from] CatalogError),
    /// The grid would contain no cells or too many to address.
    #[error("grid dimensions {width}x{height} are invalid")]
    InvalidDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// Every permitted attempt ended in a contradiction.
    #[error("no consistent map found after {attempts} attempts (last contradiction at {last_contradiction})")]
    RetriesExhausted {
        /// Attempts made before giving up.
        attempts: u64,
        /// Cell that contradicted in the final attempt.
        last_contradiction: CellCoord,
    },
}

/// Successful outcome of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Generation {
    /// Fully resolved map.
    pub map: TileMap,
    /// Attempts it took, including the successful one.
    pub attempts: u64,
}

enum AttemptOutcome {
    Resolved(TileMap),
    Contradicted(Contradiction),
}

/// Drives attempts until a grid resolves or the retry budget runs out.
#[derive(Debug)]
pub struct RunController {
    catalog: TileCatalog,
    config: Config,
    grid: GridState,
    selector: EntropySelector,
    collapse: CollapseOperator,
    propagation: PropagationEngine,
}

impl RunController {
    /// Creates a controller for `catalog`, rejecting unusable dimensions
    /// before any attempt runs.
    pub fn new(catalog: TileCatalog, config: Config) -> Result<Self, GenerationError> {
        config.validate()?;
        let grid = GridState::new(config.width(), config.height(), &catalog);

        Ok(Self {
            catalog,
            config,
            grid,
            selector: EntropySelector,
            collapse: CollapseOperator::new(),
            propagation: PropagationEngine::new(),
        })
    }

    /// Builds the catalog from raw definitions, then the controller.
    pub fn from_definitions<I>(definitions: I, config: Config) -> Result<Self, GenerationError>
    where
        I: IntoIterator<Item = TileDefinition>,
    {
        let catalog = TileCatalog::new(definitions)?;
        Self::new(catalog, config)
    }

    /// Catalog the controller solves against.
    #[must_use]
    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    /// Configuration the controller was built with.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Runs attempts drawing every random choice from `rng`.
    ///
    /// The stream is never reseeded between attempts, so a retry continues
    /// where the abandoned attempt stopped.
    pub fn run<R>(
        &mut self,
        rng: &mut R,
        trace: &mut dyn TraceSink,
    ) -> Result<Generation, GenerationError>
    where
        R: Rng + ?Sized,
    {
        let max_retries = self.config.max_retries();
        let mut attempt: u64 = 1;

        loop {
            trace.record(TraceEvent::AttemptStarted { attempt });

            match self.attempt(rng, trace) {
                AttemptOutcome::Resolved(map) => {
                    trace.record(TraceEvent::AttemptSucceeded { attempt });
                    tracing::info!(
                        attempts = attempt,
                        width = map.width(),
                        height = map.height(),
                        "tile map resolved"
                    );
                    return Ok(Generation {
                        map,
                        attempts: attempt,
                    });
                }
                AttemptOutcome::Contradicted(Contradiction { cell }) => {
                    trace.record(TraceEvent::AttemptFailed { attempt, cell });
                    tracing::debug!(
                        attempt,
                        column = cell.column(),
                        row = cell.row(),
                        "attempt contradicted, restarting"
                    );

                    let Some(next) = next_attempt(attempt, max_retries) else {
                        tracing::warn!(attempts = attempt, "retry budget exhausted");
                        return Err(GenerationError::RetriesExhausted {
                            attempts: attempt,
                            last_contradiction: cell,
                        });
                    };
                    attempt = next;
                }
            }
        }
    }

    /// Runs attempts using a ChaCha stream seeded from `seed`.
    pub fn run_seeded(
        &mut self,
        seed: u64,
        trace: &mut dyn TraceSink,
    ) -> Result<Generation, GenerationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.run(&mut rng, trace)
    }

    fn attempt<R>(&mut self, rng: &mut R, trace: &mut dyn TraceSink) -> AttemptOutcome
    where
        R: Rng + ?Sized,
    {
        self.grid.reset(&self.catalog);

        while let Some(cell) = self.selector.select(&self.grid) {
            if let Err(contradiction) =
                self.collapse
                    .collapse(&mut self.grid, &self.catalog, cell, rng, trace)
            {
                return AttemptOutcome::Contradicted(contradiction);
            }

            if let Err(contradiction) =
                self.propagation
                    .propagate(&mut self.grid, &self.catalog, cell, trace)
            {
                return AttemptOutcome::Contradicted(contradiction);
            }
        }

        if let Err(contradiction) = self
            .propagation
            .settle(&mut self.grid, &self.catalog, trace)
        {
            return AttemptOutcome::Contradicted(contradiction);
        }

        match self.grid.resolve() {
            Some(map) => AttemptOutcome::Resolved(map),
            None => {
                // Unreachable while propagation reports every emptied cell.
                let cell = self
                    .grid
                    .iter()
                    .find_map(|(cell, candidates)| candidates.is_empty().then_some(cell))
                    .unwrap_or(CellCoord::new(0, 0));
                trace.record(TraceEvent::Contradiction { cell });
                AttemptOutcome::Contradicted(Contradiction { cell })
            }
        }
    }
}

/// Number of the attempt after `attempt`, or `None` once `max_retries`
/// restarts have been used.
fn next_attempt(attempt: u64, max_retries: u32) -> Option<u64> {
    if attempt <= u64::from(max_retries) {
        attempt.checked_add(1)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_dimensions() {
        assert_eq!(
            Config::new(0, 4, 3).validate(),
            Err(GenerationError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
        assert_eq!(
            Config::new(4, 0, 3).validate(),
            Err(GenerationError::InvalidDimensions {
                width: 4,
                height: 0
            })
        );
        assert_eq!(Config::new(1, 1, 0).validate(), Ok(()));
    }

    #[test]
    fn next_attempt_spends_the_whole_retry_budget() {
        assert_eq!(next_attempt(1, 0), None);
        assert_eq!(next_attempt(1, 2), Some(2));
        assert_eq!(next_attempt(2, 2), Some(3));
        assert_eq!(next_attempt(3, 2), None);

        let last = u64::from(u32::MAX);
        assert_eq!(next_attempt(last, u32::MAX), Some(last + 1));
        assert_eq!(next_attempt(last + 1, u32::MAX), None);
    }

    #[test]
    fn errors_describe_their_cause() {
        let exhausted = GenerationError::RetriesExhausted {
            attempts: 3,
            last_contradiction: CellCoord::new(2, 5),
        };
        assert_eq!(
            exhausted.to_string(),
            "no consistent map found after 3 attempts (last contradiction at (2, 5))"
        );
        assert_eq!(
            GenerationError::from(CatalogError::Empty).to_string(),
            "invalid tile catalog: tile catalog must declare at least one tile"
        );
    }
}

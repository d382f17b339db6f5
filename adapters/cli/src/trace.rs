use tile_collapse_core::{TileCatalog, TraceEvent, TraceSink};

/// Target the step-level trace is logged under.
pub(crate) const TRACE_TARGET: &str = "tile_collapse::trace";

/// Forwards solver trace events to `tracing` with tile names resolved.
#[derive(Debug)]
pub(crate) struct LoggingTrace {
    catalog: TileCatalog,
}

impl LoggingTrace {
    /// Creates a sink that names tiles from `catalog`.
    pub(crate) fn new(catalog: TileCatalog) -> Self {
        Self { catalog }
    }

    fn describe(&self, event: &TraceEvent) -> String {
        match event {
            TraceEvent::AttemptStarted { attempt } => format!("--- Run attempt {attempt} ---"),
            TraceEvent::CellCollapsed { cell, tile } => {
                let name = self.catalog.name(*tile).unwrap_or("?");
                format!("Collapsed {cell} -> {name}")
            }
            TraceEvent::CellNarrowed {
                cell,
                before,
                after,
            } => format!(
                "Updated {cell}: {} -> {}",
                self.catalog.describe(before),
                self.catalog.describe(after)
            ),
            TraceEvent::Contradiction { cell } => format!("Contradiction at {cell}"),
            TraceEvent::AttemptSucceeded { attempt } => format!("Succeeded! (attempt {attempt})"),
            TraceEvent::AttemptFailed { attempt, cell } => {
                format!("Attempt {attempt} failed at {cell}")
            }
        }
    }
}

impl TraceSink for LoggingTrace {
    fn record(&mut self, event: TraceEvent) {
        let line = self.describe(&event);
        tracing::debug!(target: TRACE_TARGET, "{line}");
    }
}

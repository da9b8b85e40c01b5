use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use tetanus_dash::config::DashboardConfig;
use tetanus_dash::data::cache::CachedLoader;
use tetanus_dash::data::filter::{Dimension, FilterSelection};
use tetanus_dash::data::model::CaseTable;
use tetanus_dash::data::report::{build_report, DashboardReport};
use tetanus_dash::data::schema::ColumnSchema;
use tetanus_dash::geo::GeoLayer;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    loader: CachedLoader,

    /// Loaded table (shared with the loader's cache).
    pub table: Option<Arc<CaseTable>>,

    /// Per-dimension filter selections.
    pub selection: FilterSelection,

    /// Aggregates for the current selection (recomputed on every change).
    pub report: Option<DashboardReport>,

    /// Choropleth geometry, if configured and readable.
    pub geo: Option<GeoLayer>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: &DashboardConfig) -> Self {
        let geo = config.geo.as_ref().and_then(|g| {
            GeoLayer::from_config(g)
                .map_err(|e| log::error!("Map disabled, showing bars instead: {e}"))
                .ok()
        });
        Self {
            loader: CachedLoader::new(&config.data_path, config.encoding, config.schema.clone()),
            table: None,
            selection: FilterSelection::default(),
            report: None,
            geo,
            status_message: None,
        }
    }

    pub fn schema(&self) -> &ColumnSchema {
        self.loader.schema()
    }

    /// Load (or fetch from cache) the table and reset filters to "all".
    pub fn load(&mut self) -> Result<()> {
        let table = self
            .loader
            .get()
            .with_context(|| format!("loading {}", self.loader.path().display()))?;
        self.selection = FilterSelection::all(&table);
        self.table = Some(table);
        self.status_message = None;
        self.refresh();
        Ok(())
    }

    /// Drop the cached table and read the file again.
    pub fn reload(&mut self) {
        self.loader.invalidate();
        self.load_or_report();
    }

    /// Switch to another data file.
    pub fn open(&mut self, path: PathBuf) {
        let previous = self.loader.path().to_path_buf();
        self.loader.set_path(path);
        if !self.load_or_report() {
            // keep showing the previous table
            self.loader.set_path(previous);
        }
    }

    fn load_or_report(&mut self) -> bool {
        match self.load() {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
                false
            }
        }
    }

    /// Recompute the report after a filter change.
    pub fn refresh(&mut self) {
        if let Some(table) = &self.table {
            self.report = Some(build_report(table, &self.selection, self.loader.schema()));
        }
    }

    /// Toggle a single value in a dimension's filter.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        self.selection.toggle(dim, value);
        self.refresh();
    }

    /// Select all values in a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        if let Some(table) = &self.table {
            self.selection.select_all(dim, table);
            self.refresh();
        }
    }

    /// Deselect all values in a dimension.
    pub fn select_none(&mut self, dim: Dimension) {
        self.selection.select_none(dim);
        self.refresh();
    }

    pub fn data_path(&self) -> &std::path::Path {
        self.loader.path()
    }
}

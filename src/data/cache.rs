use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::loader::load_file;
use super::model::CaseTable;
use super::schema::ColumnSchema;
use crate::config::TextEncoding;
use crate::error::Result;

/// Memoizes the load step: the table is read once and served from memory
/// until [`CachedLoader::invalidate`] or a new source path.
#[derive(Debug)]
pub struct CachedLoader {
    path: PathBuf,
    encoding: TextEncoding,
    schema: ColumnSchema,
    cached: Option<Arc<CaseTable>>,
}

impl CachedLoader {
    pub fn new(path: impl Into<PathBuf>, encoding: TextEncoding, schema: ColumnSchema) -> Self {
        Self {
            path: path.into(),
            encoding,
            schema,
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.is_some()
    }

    /// Return the cached table, loading it on first use.
    pub fn get(&mut self) -> Result<Arc<CaseTable>> {
        if let Some(table) = &self.cached {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load_file(&self.path, self.encoding, &self.schema)?);
        self.cached = Some(Arc::clone(&table));
        Ok(table)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Point at a different file; drops the cached table.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.invalidate();
    }
}

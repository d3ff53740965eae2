//! Engine types
//!
//! Run statistics for the pipeline.

use crate::output::WrittenTable;
use serde::Serialize;

/// Summary of a pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Tables written, in write order
    pub tables: Vec<WrittenTable>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record written tables
    pub fn add_tables(&mut self, tables: impl IntoIterator<Item = WrittenTable>) {
        self.tables.extend(tables);
    }

    /// Look up a written table by name
    pub fn table(&self, name: &str) -> Option<&WrittenTable> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Total rows across all tables
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Total data files across all tables
    pub fn total_files(&self) -> usize {
        self.tables.iter().map(|t| t.files).sum()
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}

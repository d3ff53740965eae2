//! Table writer with overwrite semantics

use crate::error::Result;
use crate::output::partition::split_partitions;
use crate::output::writer::{encode_parquet, ParquetWriterConfig};
use crate::storage::StorageLocation;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Marker object written after every data file of a table
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Outcome of writing one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenTable {
    /// Table name (for logging)
    pub table: String,
    /// Display URL of the table directory
    pub path: String,
    /// Rows written
    pub rows: usize,
    /// Data files written
    pub files: usize,
    /// Distinct partitions written
    pub partitions: usize,
}

/// Writes whole tables as partitioned Parquet under an output location
#[derive(Debug, Clone)]
pub struct TableWriter {
    location: StorageLocation,
    config: ParquetWriterConfig,
}

impl TableWriter {
    /// Create a writer for an output location
    pub fn new(location: StorageLocation, config: ParquetWriterConfig) -> Self {
        Self { location, config }
    }

    /// The output location
    pub fn location(&self) -> &StorageLocation {
        &self.location
    }

    /// Write a table, replacing whatever exists under `table_dir`
    ///
    /// Existing objects are removed first. Data files are written next and
    /// the `_SUCCESS` marker last. If any data file fails, the files already
    /// written are removed (best effort) and no marker is written.
    pub async fn write_table(
        &self,
        table: &str,
        table_dir: &str,
        batch: &RecordBatch,
        partition_by: &[&str],
    ) -> Result<WrittenTable> {
        let table_dir = table_dir.trim_matches('/');

        let removed = self.location.delete_prefix(table_dir).await?;
        if removed > 0 {
            debug!(table, removed, "Removed previous table output");
        }

        let chunks = split_partitions(batch, partition_by)?;
        let mut written: Vec<String> = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            let key = if chunk.dir.is_empty() {
                format!("{table_dir}/{}", self.config.file_name(0))
            } else {
                format!("{table_dir}/{}/{}", chunk.dir, self.config.file_name(0))
            };

            let result = match encode_parquet(&chunk.batch, &self.config) {
                Ok(data) => self.location.write(&key, data).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(path) => {
                    debug!(table, path = %path, rows = chunk.batch.num_rows(), "Wrote data file");
                    written.push(key);
                }
                Err(e) => {
                    self.discard(table, &written).await;
                    return Err(e);
                }
            }
        }

        self.location
            .write(&format!("{table_dir}/{SUCCESS_MARKER}"), Bytes::new())
            .await?;

        let outcome = WrittenTable {
            table: table.to_string(),
            path: self.location.display_path(table_dir),
            rows: batch.num_rows(),
            files: written.len(),
            partitions: if partition_by.is_empty() { 0 } else { chunks.len() },
        };

        info!(
            table,
            path = %outcome.path,
            rows = outcome.rows,
            files = outcome.files,
            partitions = outcome.partitions,
            "Wrote table"
        );
        Ok(outcome)
    }

    /// Remove files of a failed write
    async fn discard(&self, table: &str, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.location.delete(key).await {
                warn!(table, key = %key, error = %e, "Failed to remove partial output");
            }
        }
    }
}

//! Execution engine module
//!
//! Shared execution context and pipeline orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `EtlContext` - Input/output locations, writer settings and time zone
//! - `Pipeline` - Runs the song-catalog then the event-log transformer
//! - `RunSummary` - Per-table statistics of a run

mod types;

pub use types::RunSummary;

use crate::catalog::process_song_data;
use crate::config::{Credentials, PipelineConfig};
use crate::decode::decode_json_records;
use crate::error::{Error, Result};
use crate::events::process_log_data;
use crate::output::{
    ensure_columns, json_to_arrow, ParquetWriterConfig, TableWriter, WrittenTable,
};
use crate::storage::{GlobPattern, StorageLocation};
use crate::types::TimeZoneSetting;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::time::Instant;
use tracing::{debug, info};

/// Execution context shared by every transformer
///
/// Built once at startup from the pipeline settings and credentials, then
/// only read.
#[derive(Debug)]
pub struct EtlContext {
    config: PipelineConfig,
    input: StorageLocation,
    writer: TableWriter,
}

impl EtlContext {
    /// Build a context, opening the input and output locations
    pub fn new(config: PipelineConfig, credentials: Option<&Credentials>) -> Result<Self> {
        config.validate()?;

        let input = StorageLocation::open(&config.input, credentials)?;
        let output = StorageLocation::create(&config.output, credentials)?;
        let writer = TableWriter::new(
            output,
            ParquetWriterConfig::new().with_codec(config.compression),
        );

        debug!(
            input = %input.url(),
            output = %writer.location().url(),
            timezone = %config.timezone,
            "Created execution context"
        );

        Ok(Self {
            config,
            input,
            writer,
        })
    }

    /// Pipeline settings
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Zone used for timestamp derivation
    pub fn timezone(&self) -> TimeZoneSetting {
        self.config.timezone
    }

    /// Input location
    pub fn input(&self) -> &StorageLocation {
        &self.input
    }

    /// Table writer for the output location
    pub fn writer(&self) -> &TableWriter {
        &self.writer
    }

    /// Read every file matching `pattern` into one batch per file
    ///
    /// Fails when nothing matches, when a file is malformed, or when a
    /// required column appears in no record at all.
    pub async fn read_json_units(
        &self,
        pattern: &str,
        schema: &SchemaRef,
        required: &[&str],
        source_name: &str,
    ) -> Result<Vec<RecordBatch>> {
        let glob = GlobPattern::new(pattern)?;
        let keys = self.input.list_glob(&glob).await?;
        if keys.is_empty() {
            return Err(Error::NoInputFiles {
                pattern: self.input.display_path(pattern),
            });
        }

        let mut units = Vec::with_capacity(keys.len());
        for key in &keys {
            let body = self.input.read(key).await?;
            let records = decode_json_records(&self.input.display_path(key), &body)?;
            debug!(source = source_name, key = %key, records = records.len(), "Decoded input file");
            units.push(records);
        }

        ensure_columns(units.iter().flatten(), required, source_name)?;

        let batches = units
            .iter()
            .map(|records| json_to_arrow(records, schema))
            .collect::<Result<Vec<_>>>()?;

        info!(
            source = source_name,
            files = keys.len(),
            rows = batches.iter().map(RecordBatch::num_rows).sum::<usize>(),
            "Read input"
        );
        Ok(batches)
    }

    /// Write a table under the output location, replacing previous output
    pub async fn write_table(
        &self,
        table: &str,
        table_dir: &str,
        batch: &RecordBatch,
        partition_by: &[&str],
    ) -> Result<WrittenTable> {
        self.writer
            .write_table(table, table_dir, batch, partition_by)
            .await
    }
}

/// Runs the whole job against a context
pub struct Pipeline<'a> {
    ctx: &'a EtlContext,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline over a context
    pub fn new(ctx: &'a EtlContext) -> Self {
        Self { ctx }
    }

    /// Build and write all five tables
    ///
    /// The song-catalog tables are written first, then the event-log tables.
    /// The first failure aborts the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::new();

        info!(input = %self.ctx.input().url(), "Processing song data");
        summary.add_tables(process_song_data(self.ctx).await?);

        info!(input = %self.ctx.input().url(), "Processing log data");
        summary.add_tables(process_log_data(self.ctx).await?);

        #[allow(clippy::cast_possible_truncation)]
        summary.set_duration(start.elapsed().as_millis() as u64);

        info!(
            tables = summary.tables.len(),
            rows = summary.total_rows(),
            files = summary.total_files(),
            duration_ms = summary.duration_ms,
            "Pipeline completed"
        );
        Ok(summary)
    }
}

/// Run the whole job against a context
pub async fn run(ctx: &EtlContext) -> Result<RunSummary> {
    Pipeline::new(ctx).run().await
}

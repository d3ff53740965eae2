//! Output module
//!
//! Handles Arrow RecordBatch creation and partitioned Parquet table writing.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Converting decoded JSON records to Arrow RecordBatches
//! - Encoding Parquet files in memory
//! - Splitting tables into Hive-style partitions
//! - Writing whole tables to object storage with overwrite semantics

mod partition;
mod schema;
mod table;
mod writer;

pub use partition::{
    escape_partition_value, split_partitions, PartitionChunk, HIVE_DEFAULT_PARTITION,
};
pub use schema::{ensure_columns, json_to_arrow};
pub use table::{TableWriter, WrittenTable, SUCCESS_MARKER};
pub use writer::{encode_parquet, ParquetWriterConfig};

#[cfg(test)]
mod tests;

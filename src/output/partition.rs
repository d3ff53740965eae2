//! Hive-style partitioning of output tables
//!
//! Rows are grouped by the values of the partition columns and each group is
//! written under `col1=value1/col2=value2/`. The partition columns are
//! removed from the data files, their values live in the path. Grouping runs
//! in the query engine; only directory naming happens here.

use crate::error::{Error, Result};
use crate::transform::{ident_list, quote_ident, QueryEngine};
use arrow::array::{Array, AsArray, StringArray};
use arrow::datatypes::Int64Type;
use arrow::record_batch::RecordBatch;

/// Directory name used for null partition values
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// One partition of a table ready to be written
#[derive(Debug, Clone)]
pub struct PartitionChunk {
    /// Relative directory, e.g. `year=2018/month=11` (empty when unpartitioned)
    pub dir: String,
    /// Rows of the partition, without the partition columns
    pub batch: RecordBatch,
}

/// Escape a partition value for use in a path segment
///
/// Characters that are unsafe in object keys or ambiguous in `k=v` paths are
/// percent-encoded, e.g. `AC/DC` becomes `AC%2FDC`.
pub fn escape_partition_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn needs_escape(c: char) -> bool {
    c.is_control()
        || matches!(
            c,
            '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
        )
}

/// `name=value` segment; null values go to the default partition
fn partition_segment(name: &str, value: Option<&str>) -> String {
    match value {
        Some(value) => format!("{name}={}", escape_partition_value(value)),
        None => format!("{name}={HIVE_DEFAULT_PARTITION}"),
    }
}

fn key_alias(idx: usize) -> String {
    format!("__key{idx}")
}

/// Split a batch into partitions by the given columns
///
/// Partition values are compared as text, and empty strings share the
/// default partition with nulls. Chunks are ordered by partition value with
/// the default partition last; rows keep their input order inside each
/// chunk. With no partition columns the whole batch is one chunk.
pub fn split_partitions(batch: &RecordBatch, partition_by: &[&str]) -> Result<Vec<PartitionChunk>> {
    if partition_by.is_empty() {
        return Ok(vec![PartitionChunk {
            dir: String::new(),
            batch: batch.clone(),
        }]);
    }

    let schema = batch.schema();
    for name in partition_by {
        schema
            .index_of(name)
            .map_err(|_| Error::output(format!("Unknown partition column '{name}'")))?;
    }

    let engine = QueryEngine::new()?;
    engine.register("table_rows", batch)?;

    let aliases: Vec<String> = (0..partition_by.len()).map(key_alias).collect();
    let keys = partition_by
        .iter()
        .zip(&aliases)
        .map(|(name, alias)| {
            format!("NULLIF(CAST({} AS VARCHAR), '') AS {alias}", quote_ident(name))
        })
        .collect::<Vec<_>>()
        .join(", ");
    let order = aliases
        .iter()
        .map(|alias| format!("{alias} NULLS LAST"))
        .collect::<Vec<_>>()
        .join(", ");
    engine.execute(&format!(
        "CREATE TABLE parts AS \
         SELECT *, dense_rank() OVER (ORDER BY {order}) AS __part \
         FROM (SELECT *, rowid AS __row, {keys} FROM table_rows)"
    ))?;

    let groups = engine.query(&format!(
        "SELECT DISTINCT __part, {} FROM parts ORDER BY __part",
        aliases.join(", ")
    ))?;
    let ids = groups
        .column(0)
        .as_primitive_opt::<Int64Type>()
        .ok_or_else(|| Error::output("Partition ids are not Int64"))?;
    let values = (1..groups.num_columns())
        .map(|idx| {
            groups
                .column(idx)
                .as_string_opt::<i32>()
                .ok_or_else(|| Error::output("Partition values are not text"))
        })
        .collect::<Result<Vec<&StringArray>>>()?;

    let excluded = format!(
        "{}, __row, __part, {}",
        ident_list(partition_by),
        aliases.join(", ")
    );

    (0..groups.num_rows())
        .map(|row| -> Result<PartitionChunk> {
            let dir = partition_by
                .iter()
                .zip(&values)
                .map(|(name, array)| {
                    partition_segment(name, (!array.is_null(row)).then(|| array.value(row)))
                })
                .collect::<Vec<_>>()
                .join("/");
            let batch = engine.query(&format!(
                "SELECT * EXCLUDE ({excluded}) FROM parts WHERE __part = {} ORDER BY __row",
                ids.value(row)
            ))?;
            Ok(PartitionChunk { dir, batch })
        })
        .collect()
}

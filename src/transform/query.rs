//! In-process SQL engine
//!
//! The relational steps of every table (filters, dedup, joins, partition
//! grouping) run as SQL over an in-memory DuckDB database. Batches are loaded
//! into tables through the Arrow appender and results come back as Arrow, so
//! the rest of the crate only ever sees RecordBatches.
//!
//! Tables keep their insertion order in `rowid`, which the queries use to
//! return rows in input order.

use crate::error::{Error, Result};
use arrow::compute::concat_batches;
use arrow::datatypes::{DataType, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use duckdb::Connection;
use tracing::trace;

/// Rows per appended chunk (one DuckDB vector)
const APPEND_CHUNK_ROWS: usize = 2048;

/// An in-memory DuckDB session
pub struct QueryEngine {
    conn: Connection,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine").finish_non_exhaustive()
    }
}

impl QueryEngine {
    /// Open a fresh in-memory database
    pub fn new() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::transform(format!("Failed to create DuckDB connection: {e}")))?;
        Ok(Self { conn })
    }

    /// Create (or replace) a table holding the rows of `batch`
    pub fn register(&self, name: &str, batch: &RecordBatch) -> Result<()> {
        self.create_table(name, batch.schema_ref())?;
        self.append(name, batch)
    }

    /// Create (or replace) an empty table with the columns of `schema`
    pub fn create_table(&self, name: &str, schema: &Schema) -> Result<()> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                Ok(format!(
                    "{} {}",
                    quote_ident(field.name()),
                    sql_type(field.data_type())?
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        self.execute(&format!(
            "CREATE OR REPLACE TABLE {} ({});",
            quote_ident(name),
            columns.join(", ")
        ))
    }

    /// Append the rows of `batch` to an existing table
    pub fn append(&self, name: &str, batch: &RecordBatch) -> Result<()> {
        let mut appender = self.conn.appender(name)?;
        let mut offset = 0;
        while offset < batch.num_rows() {
            let len = APPEND_CHUNK_ROWS.min(batch.num_rows() - offset);
            appender.append_record_batch(batch.slice(offset, len))?;
            offset += len;
        }
        appender.flush()?;
        Ok(())
    }

    /// Run statements that return no rows
    pub fn execute(&self, sql: &str) -> Result<()> {
        trace!(sql, "Executing statement");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Run a query and collect its result into one batch
    pub fn query(&self, sql: &str) -> Result<RecordBatch> {
        trace!(sql, "Executing query");
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_arrow([])?;
        let schema = rows.get_schema();
        let batches: Vec<RecordBatch> = rows.collect();
        Ok(concat_batches(&schema, &batches)?)
    }

    /// Run a query whose columns match `schema` and label the result with it
    pub fn query_as(&self, sql: &str, schema: &SchemaRef) -> Result<RecordBatch> {
        let result = self.query(sql)?;
        Ok(RecordBatch::try_new(schema.clone(), result.columns().to_vec())?)
    }
}

/// Quote an identifier for use in SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal for use in SQL
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// A comma-separated list of quoted identifiers
pub fn ident_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// DuckDB column type for an Arrow type
fn sql_type(data_type: &DataType) -> Result<&'static str> {
    match data_type {
        DataType::Boolean => Ok("BOOLEAN"),
        DataType::Int32 => Ok("INTEGER"),
        DataType::Int64 => Ok("BIGINT"),
        DataType::Float64 => Ok("DOUBLE"),
        DataType::Utf8 => Ok("VARCHAR"),
        DataType::Timestamp(TimeUnit::Microsecond, None) => Ok("TIMESTAMP"),
        other => Err(Error::transform(format!(
            "Unsupported column type for the query engine: {other}"
        ))),
    }
}

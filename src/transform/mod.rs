//! Transformation module
//!
//! The pieces the table builders are composed from.
//!
//! # Overview
//!
//! - `QueryEngine`: an in-memory DuckDB session that runs the relational
//!   steps (filter, distinct, join, grouping) over Arrow batches
//! - Time derivation: epoch milliseconds to wall-clock timestamps, and the
//!   SQL for calendar fields
//! - Synthetic ids for fact rows
//! - Column plumbing to attach Rust-derived columns to a batch

mod ids;
mod ops;
mod query;
mod time;

pub use ids::{monotonic_ids, ROW_BITS};
pub use ops::{column, concat, with_column};
pub use query::{ident_list, quote_ident, quote_literal, QueryEngine};
pub use time::{
    as_epoch_millis, epoch_millis_to_local_timestamp, epoch_millis_to_timestamp,
    start_time_array, CalendarField, START_TIME_TYPE,
};

//! # songplays-etl
//!
//! Batch ETL for song-play analytics. Song-catalog and event-log JSON is read
//! from object storage, reshaped into a star schema and written back as
//! Hive-partitioned Parquet.
//!
//! ## Tables
//!
//! - **songs**: distinct songs, partitioned by `year` and `artist_id`
//! - **artists**: distinct artists
//! - **users**: distinct users seen playing a song
//! - **time**: distinct play timestamps broken into calendar fields,
//!   partitioned by `year` and `month`
//! - **songplays**: plays matched to the catalog, partitioned by `year` and
//!   `month`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use songplays_etl::{config::PipelineConfig, engine::{run, EtlContext}, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::default()
//!         .with_input("./data")
//!         .with_output("./out")
//!         .with_song_data("song_data/**/*.json")
//!         .with_log_data("log_data/*.json");
//!
//!     let ctx = EtlContext::new(config, None)?;
//!     let summary = run(&ctx).await?;
//!     println!("{} rows written", summary.total_rows());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Pipeline (engine)                         │
//! │      process_song_data()  →  process_log_data()              │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌───────────┬────────────┬────┴───────┬────────────┬───────────┐
//! │  Storage  │   Decode   │ Transform  │   Output   │  Config   │
//! ├───────────┼────────────┼────────────┼────────────┼───────────┤
//! │ S3 / GCS  │ JSON       │ DuckDB SQL │ Arrow      │ dl.cfg    │
//! │ Azure     │ NDJSON     │ Distinct   │ Parquet    │ YAML      │
//! │ Local     │            │ Join       │ Hive dirs  │ CLI flags │
//! │ Glob      │            │ Time       │ _SUCCESS   │           │
//! └───────────┴────────────┴────────────┴────────────┴───────────┘
//! ```

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the job
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials and pipeline settings
pub mod config;

/// Object storage locations and glob listing
pub mod storage;

/// Source record decoding
pub mod decode;

/// Columnar transformations
pub mod transform;

/// Arrow/Parquet output
pub mod output;

/// Song-catalog transformer
pub mod catalog;

/// Event-log transformer
pub mod events;

/// Execution context and orchestration
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{Credentials, PipelineConfig};
pub use engine::{EtlContext, Pipeline, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! CLI module
//!
//! Command-line interface for running the pipeline. With no arguments the
//! job reads `dl.cfg` and runs against the stock input and output buckets;
//! every setting can be overridden by flag or pipeline file.

mod commands;
mod runner;

pub use commands::{Cli, DEFAULT_CREDENTIALS_FILE};
pub use runner::Runner;

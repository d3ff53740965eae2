//! Configuration module
//!
//! Two sources feed a run:
//!
//! - the credentials file (`dl.cfg`), an INI-style key-value file whose
//!   `[AWS]` section carries the object-store keys
//! - an optional YAML pipeline file with input/output roots, glob patterns,
//!   time zone and output layout
//!
//! Both are loaded once at startup and passed by reference afterwards.

mod credentials;
mod pipeline;

pub use credentials::{load_credentials, parse_credentials, Credentials, AWS_SECTION};
pub use pipeline::{
    load_pipeline_config, load_pipeline_config_from_str, PipelineConfig, TableLayout,
};

#[cfg(test)]
mod tests;

//! CLI runner - resolves settings and runs the pipeline

use crate::cli::commands::{Cli, DEFAULT_CREDENTIALS_FILE};
use crate::config::{load_credentials, load_pipeline_config, Credentials, PipelineConfig};
use crate::engine::{EtlContext, Pipeline, RunSummary};
use crate::error::Result;
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the pipeline and print its summary
    pub async fn run(&self) -> Result<RunSummary> {
        let config = self.pipeline_config()?;
        let credentials = self.credentials(&config)?;

        let ctx = EtlContext::new(config, credentials.as_ref())?;
        let summary = Pipeline::new(&ctx).run().await?;

        for table in &summary.tables {
            info!(
                table = %table.table,
                rows = table.rows,
                files = table.files,
                "Table summary"
            );
        }
        self.output_summary(&summary);
        Ok(summary)
    }

    /// Pipeline settings: YAML file (or defaults), then flag overrides
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.pipeline {
            Some(path) => load_pipeline_config(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(input) = &self.cli.input {
            config = config.with_input(input);
        }
        if let Some(output) = &self.cli.output {
            config = config.with_output(output);
        }
        if let Some(pattern) = &self.cli.song_data {
            config = config.with_song_data(pattern);
        }
        if let Some(pattern) = &self.cli.log_data {
            config = config.with_log_data(pattern);
        }
        if let Some(tz) = &self.cli.timezone {
            config = config.with_timezone(tz.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Storage credentials
    ///
    /// An explicit `--config` file must load. The default `dl.cfg` is read
    /// when present, and is only mandatory when a location is remote.
    pub fn credentials(&self, config: &PipelineConfig) -> Result<Option<Credentials>> {
        if let Some(path) = &self.cli.config {
            return load_credentials(path).map(Some);
        }

        let default = Path::new(DEFAULT_CREDENTIALS_FILE);
        if default.exists() || is_remote(&config.input) || is_remote(&config.output) {
            return load_credentials(default).map(Some);
        }

        debug!("No credentials file, using local storage only");
        Ok(None)
    }

    /// Print the run summary as a single JSON line
    fn output_summary(&self, summary: &RunSummary) {
        let message = json!({
            "type": "RUN_SUMMARY",
            "summary": summary,
        });
        println!("{message}");
    }
}

/// Whether a location URL points at object storage rather than local disk
pub(crate) fn is_remote(url: &str) -> bool {
    url.split_once("://")
        .is_some_and(|(scheme, _)| !scheme.eq_ignore_ascii_case("file"))
}

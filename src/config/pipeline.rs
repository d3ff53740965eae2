//! Pipeline settings loaded from YAML
//!
//! Every field has a default, so an empty file (or no file at all) reproduces
//! the job's stock layout.

use crate::error::{Error, Result};
use crate::types::{CompressionCodec, TimeZoneSetting};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input root (bucket URL or local directory)
    #[serde(default = "default_input")]
    pub input: String,

    /// Output root (bucket URL or local directory)
    #[serde(default = "default_output")]
    pub output: String,

    /// Glob for song-catalog files, relative to `input`
    #[serde(default = "default_song_data")]
    pub song_data: String,

    /// Glob for event-log files, relative to `input`
    #[serde(default = "default_log_data")]
    pub log_data: String,

    /// Zone used to turn `ts` into `start_time`
    #[serde(default)]
    pub timezone: TimeZoneSetting,

    /// Parquet compression codec
    #[serde(default)]
    pub compression: CompressionCodec,

    /// Output directory of each table, relative to `output`
    #[serde(default)]
    pub tables: TableLayout,
}

fn default_input() -> String {
    "s3a://udacity-dend/".to_string()
}

fn default_output() -> String {
    "s3a://project4-outputs/".to_string()
}

fn default_song_data() -> String {
    "song_data/A/B/C/*.json".to_string()
}

fn default_log_data() -> String {
    "log_data/2018/11/*.json".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            song_data: default_song_data(),
            log_data: default_log_data(),
            timezone: TimeZoneSetting::default(),
            compression: CompressionCodec::default(),
            tables: TableLayout::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the input root
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    /// Set the output root
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Set the song-catalog glob
    #[must_use]
    pub fn with_song_data(mut self, pattern: impl Into<String>) -> Self {
        self.song_data = pattern.into();
        self
    }

    /// Set the event-log glob
    #[must_use]
    pub fn with_log_data(mut self, pattern: impl Into<String>) -> Self {
        self.log_data = pattern.into();
        self
    }

    /// Set the time zone
    #[must_use]
    pub fn with_timezone(mut self, timezone: TimeZoneSetting) -> Self {
        self.timezone = timezone;
        self
    }

    /// Set the compression codec
    #[must_use]
    pub fn with_compression(mut self, compression: CompressionCodec) -> Self {
        self.compression = compression;
        self
    }

    /// Check that all locations are usable
    pub fn validate(&self) -> Result<()> {
        let non_empty = [
            ("input", &self.input),
            ("output", &self.output),
            ("song_data", &self.song_data),
            ("log_data", &self.log_data),
            ("tables.songs", &self.tables.songs),
            ("tables.artists", &self.tables.artists),
            ("tables.users", &self.tables.users),
            ("tables.time", &self.tables.time),
            ("tables.songplays", &self.tables.songplays),
        ];
        for (field, value) in non_empty {
            if value.trim().is_empty() {
                return Err(Error::invalid_value(field, "must not be empty"));
            }
        }

        if self.input.trim_end_matches('/') == self.output.trim_end_matches('/') {
            return Err(Error::invalid_value(
                "output",
                "must differ from input, tables are written with overwrite semantics",
            ));
        }
        Ok(())
    }
}

/// Output directory names for the five tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableLayout {
    pub songs: String,
    pub artists: String,
    pub users: String,
    pub time: String,
    pub songplays: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            songs: "songs/songs.parquet".to_string(),
            artists: "artists/artists.parquet".to_string(),
            users: "users/users.parquet".to_string(),
            time: "time/time.parquet".to_string(),
            songplays: "songplays/songplays.parquet".to_string(),
        }
    }
}

/// Load a pipeline config from a YAML file
pub fn load_pipeline_config(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read pipeline file '{}': {e}",
            path.display()
        ))
    })?;
    load_pipeline_config_from_str(&content)
}

/// Load a pipeline config from a YAML string
pub fn load_pipeline_config_from_str(yaml: &str) -> Result<PipelineConfig> {
    // serde_yaml rejects an empty document, treat it as all defaults
    if yaml.trim().is_empty() {
        return Ok(PipelineConfig::default());
    }
    let config: PipelineConfig = serde_yaml::from_str(yaml)?;
    config.validate()?;
    Ok(config)
}

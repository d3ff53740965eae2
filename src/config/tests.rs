//! Tests for config module

use super::*;
use crate::error::Error;
use crate::types::{CompressionCodec, TimeZoneSetting};
use pretty_assertions::assert_eq;
use std::io::Write;

// ============================================================================
// Credentials Tests
// ============================================================================

#[test]
fn test_parse_credentials() {
    let creds = parse_credentials(
        "[AWS]\nAWS_ACCESS_KEY_ID=key\nAWS_SECRET_ACCESS_KEY=secret\nAWS_DEFAULT_REGION=us-west-2\n",
    )
    .unwrap();
    assert_eq!(creds.access_key_id, "key");
    assert_eq!(creds.secret_access_key, "secret");
    assert_eq!(creds.region.as_deref(), Some("us-west-2"));
    assert_eq!(creds.endpoint, None);
}

#[test]
fn test_parse_credentials_with_comments_and_quotes() {
    let content = r"
# credentials for the job
[AWS]
AWS_ACCESS_KEY_ID = AKIAEXAMPLE
; secret below is quoted
AWS_SECRET_ACCESS_KEY: 'secret/with=chars'

[OTHER]
name=value
";
    let creds = parse_credentials(content).unwrap();
    assert_eq!(creds.access_key_id, "AKIAEXAMPLE");
    assert_eq!(creds.secret_access_key, "secret/with=chars");
}

#[test]
fn test_parse_credentials_keys_case_insensitive() {
    let creds =
        parse_credentials("[aws]\naws_access_key_id=key\naws_secret_access_key=secret\n").unwrap();
    assert_eq!(creds, Credentials::new("key", "secret"));
}

#[test]
fn test_parse_credentials_missing_section() {
    let err = parse_credentials("[GCP]\nkey=value\n").unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().contains("[AWS]"));
}

#[test]
fn test_parse_credentials_missing_secret() {
    let err = parse_credentials("[AWS]\nAWS_ACCESS_KEY_ID=key\n").unwrap_err();
    assert!(matches!(
        err,
        Error::MissingConfigField { ref field } if field == "AWS_SECRET_ACCESS_KEY"
    ));
}

#[test]
fn test_parse_credentials_empty_value() {
    let err = parse_credentials("[AWS]\nAWS_ACCESS_KEY_ID=''\nAWS_SECRET_ACCESS_KEY=s\n")
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfigValue { .. }));
}

#[test]
fn test_credentials_debug_redacts_secret() {
    let creds = Credentials::new("key", "super-secret");
    let debug = format!("{creds:?}");
    assert!(debug.contains("key"));
    assert!(!debug.contains("super-secret"));
}

#[test]
fn test_load_credentials_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[AWS]").unwrap();
    writeln!(file, "AWS_ACCESS_KEY_ID=file-key").unwrap();
    writeln!(file, "AWS_SECRET_ACCESS_KEY=file-secret").unwrap();

    let creds = load_credentials(file.path()).unwrap();
    assert_eq!(creds.access_key_id, "file-key");
}

#[test]
fn test_load_credentials_missing_file() {
    let err = load_credentials("/definitely/not/here/dl.cfg").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

// ============================================================================
// Pipeline Config Tests
// ============================================================================

#[test]
fn test_pipeline_defaults() {
    let config = PipelineConfig::default();
    assert_eq!(config.input, "s3a://udacity-dend/");
    assert_eq!(config.output, "s3a://project4-outputs/");
    assert_eq!(config.song_data, "song_data/A/B/C/*.json");
    assert_eq!(config.log_data, "log_data/2018/11/*.json");
    assert_eq!(config.timezone, TimeZoneSetting::Local);
    assert_eq!(config.compression, CompressionCodec::Snappy);
    assert_eq!(config.tables.songplays, "songplays/songplays.parquet");
}

#[test]
fn test_pipeline_empty_yaml_is_default() {
    let config = load_pipeline_config_from_str("   \n").unwrap();
    assert_eq!(config, PipelineConfig::default());
}

#[test]
fn test_pipeline_partial_yaml() {
    let yaml = r#"
input: /data/in
output: /data/out
song_data: "song_data/*/*/*/*.json"
timezone: utc
compression: zstd
tables:
  time: time_table
"#;
    let config = load_pipeline_config_from_str(yaml).unwrap();
    assert_eq!(config.input, "/data/in");
    assert_eq!(config.song_data, "song_data/*/*/*/*.json");
    assert_eq!(config.log_data, "log_data/2018/11/*.json");
    assert_eq!(config.timezone, TimeZoneSetting::Utc);
    assert_eq!(config.compression, CompressionCodec::Zstd);
    assert_eq!(config.tables.time, "time_table");
    assert_eq!(config.tables.songs, "songs/songs.parquet");
}

#[test]
fn test_pipeline_rejects_unknown_fields() {
    assert!(load_pipeline_config_from_str("inputs: /tmp\n").is_err());
}

#[test]
fn test_pipeline_rejects_bad_timezone() {
    assert!(load_pipeline_config_from_str("timezone: somewhere\n").is_err());
}

#[test]
fn test_pipeline_validate_same_input_output() {
    let config = PipelineConfig::default()
        .with_input("/data/lake/")
        .with_output("/data/lake");
    assert!(config.validate().is_err());
}

#[test]
fn test_pipeline_validate_empty_pattern() {
    let config = PipelineConfig::default().with_log_data(" ");
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("log_data"));
}

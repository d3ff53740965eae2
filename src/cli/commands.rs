//! CLI arguments

use clap::Parser;
use std::path::PathBuf;

/// Credentials file read when no `--config` is given
pub const DEFAULT_CREDENTIALS_FILE: &str = "dl.cfg";

/// Song-play analytics ETL
///
/// Reads song-catalog and event-log JSON, builds the songs, artists, users,
/// time and songplays tables, and writes them as partitioned Parquet.
#[derive(Parser, Debug, Default)]
#[command(name = "songplays-etl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Credentials file (INI, `[AWS]` section) [default: dl.cfg]
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Pipeline settings file (YAML)
    #[arg(short, long)]
    pub pipeline: Option<PathBuf>,

    /// Input root (s3a://bucket/, gs://bucket/, or a local directory)
    #[arg(short, long)]
    pub input: Option<String>,

    /// Output root (s3a://bucket/, gs://bucket/, or a local directory)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Glob for song-catalog files, relative to the input root
    #[arg(long)]
    pub song_data: Option<String>,

    /// Glob for event-log files, relative to the input root
    #[arg(long)]
    pub log_data: Option<String>,

    /// Time zone for start_time: local, utc, or an offset such as +08:00
    #[arg(long)]
    pub timezone: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

//! Song-catalog transformer
//!
//! Reads the raw song/artist records and produces the `songs` and `artists`
//! dimension tables.

use crate::engine::EtlContext;
use crate::error::{Result, ResultExt};
use crate::output::WrittenTable;
use crate::transform::{concat, quote_ident, QueryEngine};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::info;

/// Name used for the catalog source in logs and errors
pub const SOURCE_NAME: &str = "song catalog";

/// Declared schema of raw song-catalog records
pub static SONG_CATALOG_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("artist_latitude", DataType::Float64, true),
        Field::new("artist_location", DataType::Utf8, true),
        Field::new("artist_longitude", DataType::Float64, true),
        Field::new("artist_name", DataType::Utf8, true),
        Field::new("duration", DataType::Float64, true),
        Field::new("num_songs", DataType::Int64, true),
        Field::new("song_id", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("year", DataType::Int64, true),
    ]))
});

/// Catalog columns every input must carry
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "song_id",
    "title",
    "artist_id",
    "year",
    "duration",
    "artist_name",
    "artist_location",
    "artist_latitude",
    "artist_longitude",
];

/// Columns of the `songs` table
pub const SONGS_COLUMNS: [&str; 5] = ["song_id", "title", "artist_id", "year", "duration"];

/// Partition columns of the `songs` table
pub const SONGS_PARTITION_BY: [&str; 2] = ["year", "artist_id"];

const ARTISTS_SOURCE_COLUMNS: [&str; 5] = [
    "artist_id",
    "artist_name",
    "artist_location",
    "artist_latitude",
    "artist_longitude",
];

/// Columns of the `artists` table
pub const ARTISTS_COLUMNS: [&str; 5] = ["artist_id", "name", "location", "latitude", "longitude"];

/// Read every song-catalog file matched by the configured glob
pub async fn read_song_catalog(ctx: &EtlContext) -> Result<RecordBatch> {
    let units = ctx
        .read_json_units(
            &ctx.config().song_data,
            &SONG_CATALOG_SCHEMA,
            &REQUIRED_COLUMNS,
            SOURCE_NAME,
        )
        .await?;
    concat(&SONG_CATALOG_SCHEMA, &units)
}

/// Distinct rows of the given `(source, output)` columns, in first-seen order
fn distinct_projection(catalog: &RecordBatch, columns: &[(&str, &str)]) -> Result<RecordBatch> {
    let engine = QueryEngine::new()?;
    engine.register("catalog", catalog)?;

    let select = columns
        .iter()
        .map(|(source, output)| format!("{} AS {}", quote_ident(source), quote_ident(output)))
        .collect::<Vec<_>>()
        .join(", ");
    engine.query(&format!(
        "SELECT {select} FROM catalog GROUP BY ALL ORDER BY min(rowid)"
    ))
}

/// Build the `songs` table: distinct (song_id, title, artist_id, year, duration)
pub fn build_songs_table(catalog: &RecordBatch) -> Result<RecordBatch> {
    let columns: Vec<(&str, &str)> = SONGS_COLUMNS.iter().map(|c| (*c, *c)).collect();
    distinct_projection(catalog, &columns)
}

/// Build the `artists` table: distinct artist attributes, renamed
pub fn build_artists_table(catalog: &RecordBatch) -> Result<RecordBatch> {
    let columns: Vec<(&str, &str)> = ARTISTS_SOURCE_COLUMNS
        .iter()
        .copied()
        .zip(ARTISTS_COLUMNS)
        .collect();
    distinct_projection(catalog, &columns)
}

/// Build and write the `songs` and `artists` tables
pub async fn process_song_data(ctx: &EtlContext) -> Result<Vec<WrittenTable>> {
    let catalog = read_song_catalog(ctx).await?;
    info!(rows = catalog.num_rows(), "Loaded song catalog");

    let tables = &ctx.config().tables;

    let songs = build_songs_table(&catalog).context("Failed to build songs table")?;
    let songs = ctx
        .write_table("songs", &tables.songs, &songs, &SONGS_PARTITION_BY)
        .await?;

    let artists = build_artists_table(&catalog).context("Failed to build artists table")?;
    let artists = ctx
        .write_table("artists", &tables.artists, &artists, &[])
        .await?;

    Ok(vec![songs, artists])
}

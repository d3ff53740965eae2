//! Event-log transformer
//!
//! Reads the listening-event log and produces the `users` and `time`
//! dimension tables and the `songplays` fact table. Only `NextSong` events
//! describe plays; every table here is built from those.

use crate::catalog::read_song_catalog;
use crate::engine::EtlContext;
use crate::error::{Error, Result, ResultExt};
use crate::output::WrittenTable;
use crate::transform::{
    as_epoch_millis, column, concat, ident_list, monotonic_ids, quote_ident, quote_literal,
    start_time_array, with_column, CalendarField, QueryEngine, START_TIME_TYPE,
};
use crate::types::TimeZoneSetting;
use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::{debug, info};

/// Name used for the event source in logs and errors
pub const SOURCE_NAME: &str = "event log";

/// Page value marking a song play
pub const NEXT_SONG: &str = "NextSong";

/// Declared schema of raw event-log records
pub static LOG_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("artist", DataType::Utf8, true),
        Field::new("auth", DataType::Utf8, true),
        Field::new("firstName", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("itemInSession", DataType::Int64, true),
        Field::new("lastName", DataType::Utf8, true),
        Field::new("length", DataType::Float64, true),
        Field::new("level", DataType::Utf8, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("method", DataType::Utf8, true),
        Field::new("page", DataType::Utf8, true),
        Field::new("registration", DataType::Float64, true),
        Field::new("sessionId", DataType::Int64, true),
        Field::new("song", DataType::Utf8, true),
        Field::new("status", DataType::Int64, true),
        Field::new("ts", DataType::Int64, true),
        Field::new("userAgent", DataType::Utf8, true),
        Field::new("userId", DataType::Utf8, true),
    ]))
});

/// Event columns every input must carry
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "page",
    "userId",
    "firstName",
    "lastName",
    "gender",
    "level",
    "ts",
    "song",
    "artist",
    "sessionId",
    "location",
    "userAgent",
];

/// Columns of the `users` table
pub const USERS_COLUMNS: [&str; 5] = ["user_id", "first_name", "last_name", "gender", "level"];

/// Calendar columns of the `time` table, in output order
pub const TIME_FIELDS: [CalendarField; 6] = [
    CalendarField::Hour,
    CalendarField::Day,
    CalendarField::Week,
    CalendarField::Month,
    CalendarField::Year,
    CalendarField::Weekday,
];

/// Partition columns of the `time` and `songplays` tables
pub const TIME_PARTITION_BY: [&str; 2] = ["year", "month"];

/// Columns of the `songplays` table
pub const SONGPLAYS_COLUMNS: [&str; 11] = [
    "songplay_id",
    "start_time",
    "user_id",
    "level",
    "song_id",
    "artist_id",
    "session_id",
    "location",
    "user_agent",
    "month",
    "year",
];

/// Schema of the `songplays` table
pub static SONGPLAYS_SCHEMA: Lazy<SchemaRef> = Lazy::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("songplay_id", DataType::Int64, true),
        Field::new("start_time", START_TIME_TYPE, true),
        Field::new("user_id", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
        Field::new("song_id", DataType::Utf8, true),
        Field::new("artist_id", DataType::Utf8, true),
        Field::new("session_id", DataType::Int64, true),
        Field::new("location", DataType::Utf8, true),
        Field::new("user_agent", DataType::Utf8, true),
        Field::new("month", DataType::Int32, true),
        Field::new("year", DataType::Int32, true),
    ]))
});

/// Read every event-log file matched by the configured glob
///
/// Returns one batch per source file, in listing order. Each file is a unit
/// of work for songplay id assignment.
pub async fn read_event_log(ctx: &EtlContext) -> Result<Vec<RecordBatch>> {
    ctx.read_json_units(
        &ctx.config().log_data,
        &LOG_SCHEMA,
        &REQUIRED_COLUMNS,
        SOURCE_NAME,
    )
    .await
}

/// Keep only song-play events, in input order
pub fn filter_next_song(events: &RecordBatch) -> Result<RecordBatch> {
    let engine = QueryEngine::new()?;
    engine.register("events", events)?;
    engine.query(&format!(
        "SELECT * FROM events WHERE page = {} ORDER BY rowid",
        quote_literal(NEXT_SONG)
    ))
}

/// Load `events` and derive the `plays` table: song plays with a known `ts`
/// and their `start_time`
fn load_plays(engine: &QueryEngine, events: &RecordBatch, tz: TimeZoneSetting) -> Result<()> {
    engine.register("events", events)?;
    let plays = engine.query(&format!(
        "SELECT * FROM events WHERE page = {} AND ts IS NOT NULL ORDER BY rowid",
        quote_literal(NEXT_SONG)
    ))?;
    engine.register("plays", &with_start_time(&plays, tz)?)
}

/// Append `start_time` derived from the `ts` column
fn with_start_time(batch: &RecordBatch, tz: TimeZoneSetting) -> Result<RecordBatch> {
    let ts = as_epoch_millis(column(batch, "ts")?.as_ref())?;
    let start_time: ArrayRef = Arc::new(start_time_array(ts, tz)?);
    with_column(batch, "start_time", start_time)
}

/// `expr AS name` select items for calendar fields of `column`
fn calendar_columns(column: &str, fields: &[CalendarField]) -> String {
    fields
        .iter()
        .map(|field| format!("{} AS {}", field.sql(column), quote_ident(field.name())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the `users` table from raw events
///
/// Dedup is over the full row, so a user whose level changed appears once
/// per level. User ids that are not integers become null.
pub fn build_users_table(events: &RecordBatch) -> Result<RecordBatch> {
    let engine = QueryEngine::new()?;
    engine.register("events", events)?;
    engine.query(&format!(
        "SELECT TRY_CAST(\"userId\" AS INTEGER) AS user_id, \
                \"firstName\" AS first_name, \
                \"lastName\" AS last_name, \
                gender, \
                level \
         FROM events \
         WHERE page = {} AND \"userId\" IS NOT NULL \
         GROUP BY ALL \
         ORDER BY min(rowid)",
        quote_literal(NEXT_SONG)
    ))
}

/// Build the `time` table from raw events
pub fn build_time_table(events: &RecordBatch, tz: TimeZoneSetting) -> Result<RecordBatch> {
    let engine = QueryEngine::new()?;
    load_plays(&engine, events, tz)?;
    engine.query(&format!(
        "SELECT start_time, {} \
         FROM plays \
         GROUP BY ts, start_time \
         ORDER BY min(rowid)",
        calendar_columns("start_time", &TIME_FIELDS)
    ))
}

/// Match one unit's plays to the catalog on song title and artist name
///
/// Rows come back in play order, then catalog order, so ids assigned over
/// them increase with the input.
fn songplays_unit_sql() -> String {
    format!(
        "SELECT p.start_time, \
                p.\"userId\" AS user_id, \
                p.level, \
                c.song_id, \
                c.artist_id, \
                p.\"sessionId\" AS session_id, \
                p.location, \
                p.\"userAgent\" AS user_agent, \
                {} \
         FROM plays p \
         JOIN catalog c ON p.song = c.title AND p.artist = c.artist_name \
         ORDER BY p.rowid, c.rowid",
        calendar_columns("p.start_time", &[CalendarField::Month, CalendarField::Year])
    )
}

/// Build the `songplays` table from per-file event batches and the catalog
///
/// Each file is a unit of work: its matched plays get ids `(unit << 33) +
/// row`. Rows are then deduplicated on every column except `songplay_id`,
/// keeping the lowest id.
pub fn build_songplays_table(
    units: &[RecordBatch],
    catalog: &RecordBatch,
    tz: TimeZoneSetting,
) -> Result<RecordBatch> {
    let engine = QueryEngine::new()?;
    engine.register("catalog", catalog)?;
    engine.create_table("songplays", &SONGPLAYS_SCHEMA)?;

    let unit_sql = songplays_unit_sql();
    for (index, events) in units.iter().enumerate() {
        let unit = u32::try_from(index)
            .map_err(|_| Error::transform(format!("Too many event files: {index}")))?;

        load_plays(&engine, events, tz)?;
        let matched = engine.query(&unit_sql)?;

        let ids: ArrayRef = Arc::new(monotonic_ids(unit, matched.num_rows())?);
        let mut columns = vec![ids];
        columns.extend_from_slice(matched.columns());
        let rows = RecordBatch::try_new(SONGPLAYS_SCHEMA.clone(), columns)?;

        debug!(unit, rows = rows.num_rows(), "Matched plays to catalog");
        engine.append("songplays", &rows)?;
    }

    let keys = ident_list(&SONGPLAYS_COLUMNS[1..]);
    engine.query_as(
        &format!(
            "SELECT min(songplay_id) AS songplay_id, {keys} \
             FROM songplays \
             GROUP BY {keys} \
             ORDER BY 1"
        ),
        &SONGPLAYS_SCHEMA,
    )
}

/// Build and write the `users`, `time` and `songplays` tables
pub async fn process_log_data(ctx: &EtlContext) -> Result<Vec<WrittenTable>> {
    let units = read_event_log(ctx).await?;
    let events = concat(&LOG_SCHEMA, &units)?;
    info!(rows = events.num_rows(), files = units.len(), "Loaded event log");

    let tables = &ctx.config().tables;
    let tz = ctx.timezone();

    let users = build_users_table(&events).context("Failed to build users table")?;
    let users = ctx.write_table("users", &tables.users, &users, &[]).await?;

    let time = build_time_table(&events, tz).context("Failed to build time table")?;
    let time = ctx
        .write_table("time", &tables.time, &time, &TIME_PARTITION_BY)
        .await?;

    let catalog = read_song_catalog(ctx).await?;
    debug!(rows = catalog.num_rows(), "Re-read song catalog for join");

    let songplays = build_songplays_table(&units, &catalog, tz)
        .context("Failed to build songplays table")?;
    let songplays = ctx
        .write_table("songplays", &tables.songplays, &songplays, &TIME_PARTITION_BY)
        .await?;

    Ok(vec![users, time, songplays])
}

//! Tests for output module

use super::*;
use crate::storage::StorageLocation;
use crate::types::{CompressionCodec, JsonObject};
use arrow::array::{Array, AsArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Int64Type, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

fn objects(values: Vec<serde_json::Value>) -> Vec<JsonObject> {
    values
        .into_iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect()
}

fn song_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("song_id", DataType::Utf8, true),
        Field::new("year", DataType::Int64, true),
        Field::new("duration", DataType::Float64, true),
    ]))
}

fn read_parquet(data: Bytes) -> RecordBatch {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<RecordBatch> = reader.map(|b| b.unwrap()).collect();
    arrow::compute::concat_batches(&batches[0].schema(), &batches).unwrap()
}

// ============================================================================
// JSON to Arrow Tests
// ============================================================================

#[test]
fn test_json_to_arrow_coerces_types() {
    let records = objects(vec![
        json!({"song_id": "S1", "year": 2000, "duration": 100}),
        json!({"song_id": 7, "year": 1999.0, "duration": 12.5, "extra": true}),
        json!({"song_id": null, "year": "unknown"}),
    ]);

    let batch = json_to_arrow(&records, &song_schema()).unwrap();
    assert_eq!(batch.num_rows(), 3);
    assert_eq!(batch.num_columns(), 3);

    let ids = batch.column(0).as_string::<i32>();
    assert_eq!(ids.value(0), "S1");
    assert_eq!(ids.value(1), "7");
    assert!(ids.is_null(2));

    let years = batch.column(1).as_primitive::<Int64Type>();
    assert_eq!(years.value(0), 2000);
    assert_eq!(years.value(1), 1999);
    assert!(years.is_null(2));

    let durations = batch
        .column(2)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    assert_eq!(durations.value(0), 100.0);
    assert!(durations.is_null(2));
}

#[test]
fn test_json_to_arrow_empty() {
    let batch = json_to_arrow(&[], &song_schema()).unwrap();
    assert_eq!(batch.num_rows(), 0);
    assert_eq!(batch.schema(), song_schema());
}

#[test]
fn test_ensure_columns() {
    let records = objects(vec![
        json!({"song_id": "S1", "year": 2000}),
        json!({"song_id": "S2", "duration": 1.0}),
    ]);
    let required = ["song_id", "year", "duration"];
    ensure_columns(&records, &required, "song catalog").unwrap();

    let records = objects(vec![json!({"song_id": "S1", "year": 2000})]);
    let err = ensure_columns(&records, &required, "song catalog").unwrap_err();
    assert!(err.to_string().contains("'duration'"));

    let none: Vec<JsonObject> = Vec::new();
    ensure_columns(&none, &required, "song catalog").unwrap();
}

// ============================================================================
// Parquet Encoding Tests
// ============================================================================

#[test]
fn test_writer_config_file_names() {
    assert_eq!(
        ParquetWriterConfig::default().file_name(0),
        "part-00000.snappy.parquet"
    );
    assert_eq!(
        ParquetWriterConfig::new()
            .with_codec(CompressionCodec::None)
            .file_name(3),
        "part-00003.parquet"
    );
}

#[test]
fn test_encode_parquet_roundtrip_values() {
    let records = objects(vec![
        json!({"song_id": "S1", "year": 2000, "duration": 1.5}),
        json!({"song_id": "S2", "year": 2001, "duration": 2.5}),
    ]);
    let batch = json_to_arrow(&records, &song_schema()).unwrap();

    let config = ParquetWriterConfig::new().with_codec(CompressionCodec::Zstd);
    let data = encode_parquet(&batch, &config).unwrap();
    assert_eq!(&data[..4], b"PAR1");

    let read = read_parquet(data);
    assert_eq!(read.num_rows(), 2);
    assert_eq!(read.columns(), batch.columns());
}

// ============================================================================
// Partition Tests
// ============================================================================

#[test]
fn test_escape_partition_value() {
    assert_eq!(escape_partition_value("ARJIE2Y1187B994AB7"), "ARJIE2Y1187B994AB7");
    assert_eq!(escape_partition_value("AC/DC"), "AC%2FDC");
    assert_eq!(escape_partition_value("a=b:c"), "a%3Db%3Ac");
    assert_eq!(escape_partition_value("Beyoncé"), "Beyoncé");
}

#[test]
fn test_split_partitions() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("song_id", DataType::Utf8, true),
        Field::new("year", DataType::Int64, true),
        Field::new("artist_id", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["S1", "S2", "S3", "S4"])),
            Arc::new(Int64Array::from(vec![Some(2000), Some(1999), Some(2000), None])),
            Arc::new(StringArray::from(vec!["A1", "A2", "A1", "A3"])),
        ],
    )
    .unwrap();

    let chunks = split_partitions(&batch, &["year", "artist_id"]).unwrap();
    let dirs: Vec<&str> = chunks.iter().map(|c| c.dir.as_str()).collect();
    assert_eq!(
        dirs,
        vec![
            "year=1999/artist_id=A2",
            "year=2000/artist_id=A1",
            "year=__HIVE_DEFAULT_PARTITION__/artist_id=A3",
        ]
    );

    let first = &chunks[1].batch;
    assert_eq!(first.num_columns(), 1);
    assert_eq!(first.schema().field(0).name(), "song_id");
    let ids = first.column(0).as_string::<i32>();
    assert_eq!(ids.value(0), "S1");
    assert_eq!(ids.value(1), "S3");
}

#[test]
fn test_split_empty_and_null_values_share_default_partition() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("song_id", DataType::Utf8, true),
        Field::new("artist_id", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["S1", "S2", "S3"])),
            Arc::new(StringArray::from(vec![Some(""), Some("AC/DC"), None])),
        ],
    )
    .unwrap();

    let chunks = split_partitions(&batch, &["artist_id"]).unwrap();
    let dirs: Vec<&str> = chunks.iter().map(|c| c.dir.as_str()).collect();
    assert_eq!(
        dirs,
        vec!["artist_id=AC%2FDC", "artist_id=__HIVE_DEFAULT_PARTITION__"]
    );
    assert_eq!(chunks[1].batch.num_rows(), 2);
}

#[test]
fn test_split_unpartitioned() {
    let batch = RecordBatch::new_empty(song_schema());
    let chunks = split_partitions(&batch, &[]).unwrap();
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].dir.is_empty());
}

#[test]
fn test_split_unknown_column() {
    let batch = RecordBatch::new_empty(song_schema());
    assert!(split_partitions(&batch, &["month"]).is_err());
}

// ============================================================================
// Table Writer Tests
// ============================================================================

#[tokio::test]
async fn test_write_table_partitioned_and_overwrite() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::create(temp_dir.path().to_str().unwrap(), None).unwrap();
    let writer = TableWriter::new(location.clone(), ParquetWriterConfig::default());

    let first = json_to_arrow(
        &objects(vec![
            json!({"song_id": "S1", "year": 2000, "duration": 1.0}),
            json!({"song_id": "S2", "year": 2001, "duration": 2.0}),
        ]),
        &song_schema(),
    )
    .unwrap();
    let outcome = writer
        .write_table("songs", "songs/songs.parquet", &first, &["year"])
        .await
        .unwrap();
    assert_eq!(outcome.rows, 2);
    assert_eq!(outcome.files, 2);
    assert_eq!(outcome.partitions, 2);

    let second = json_to_arrow(
        &objects(vec![json!({"song_id": "S3", "year": 2005, "duration": 3.0})]),
        &song_schema(),
    )
    .unwrap();
    writer
        .write_table("songs", "songs/songs.parquet", &second, &["year"])
        .await
        .unwrap();

    let keys = location.list("songs/songs.parquet").await.unwrap();
    assert_eq!(
        keys,
        vec![
            "songs/songs.parquet/_SUCCESS".to_string(),
            "songs/songs.parquet/year=2005/part-00000.snappy.parquet".to_string(),
        ]
    );

    let data = location
        .read("songs/songs.parquet/year=2005/part-00000.snappy.parquet")
        .await
        .unwrap();
    let read = read_parquet(data);
    assert_eq!(read.num_rows(), 1);
    assert_eq!(read.schema().fields().len(), 2);
}

#[tokio::test]
async fn test_write_table_escaped_partition_directories() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::create(temp_dir.path().to_str().unwrap(), None).unwrap();
    let writer = TableWriter::new(location.clone(), ParquetWriterConfig::default());

    let schema = Arc::new(Schema::new(vec![
        Field::new("song_id", DataType::Utf8, true),
        Field::new("artist_id", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec!["S1", "S2", "S3"])),
            Arc::new(StringArray::from(vec![Some("AC/DC"), Some("50%"), None])),
        ],
    )
    .unwrap();
    writer
        .write_table("songs", "songs", &batch, &["artist_id"])
        .await
        .unwrap();

    let mut dirs: Vec<String> = std::fs::read_dir(temp_dir.path().join("songs"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with("artist_id="))
        .collect();
    dirs.sort();
    assert_eq!(
        dirs,
        vec![
            "artist_id=50%25",
            "artist_id=AC%2FDC",
            "artist_id=__HIVE_DEFAULT_PARTITION__",
        ]
    );

    let data = location
        .read("songs/artist_id=AC%2FDC/part-00000.snappy.parquet")
        .await
        .unwrap();
    let read = read_parquet(data);
    assert_eq!(read.column(0).as_string::<i32>().value(0), "S1");

    // A rerun replaces escaped directories instead of leaving them behind
    writer
        .write_table("songs", "songs", &batch.slice(0, 1), &["artist_id"])
        .await
        .unwrap();
    assert_eq!(
        location.list("songs").await.unwrap(),
        vec![
            "songs/_SUCCESS".to_string(),
            "songs/artist_id=AC%2FDC/part-00000.snappy.parquet".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_write_empty_unpartitioned_table_keeps_schema() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::create(temp_dir.path().to_str().unwrap(), None).unwrap();
    let writer = TableWriter::new(location.clone(), ParquetWriterConfig::default());

    let empty = RecordBatch::new_empty(song_schema());
    let outcome = writer
        .write_table("artists", "artists", &empty, &[])
        .await
        .unwrap();
    assert_eq!(outcome.rows, 0);
    assert_eq!(outcome.files, 1);

    let data = location
        .read("artists/part-00000.snappy.parquet")
        .await
        .unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(data).unwrap();
    assert_eq!(builder.schema().fields().len(), 3);
}

#[tokio::test]
async fn test_write_empty_partitioned_table_only_marker() {
    let temp_dir = tempdir().unwrap();
    let location = StorageLocation::create(temp_dir.path().to_str().unwrap(), None).unwrap();
    let writer = TableWriter::new(location.clone(), ParquetWriterConfig::default());

    let empty = RecordBatch::new_empty(song_schema());
    let outcome = writer
        .write_table("songs", "songs", &empty, &["year"])
        .await
        .unwrap();
    assert_eq!(outcome.files, 0);
    assert_eq!(
        location.list("songs").await.unwrap(),
        vec!["songs/_SUCCESS".to_string()]
    );
}

//! Parquet encoding
//!
//! Encodes Arrow RecordBatches into in-memory Parquet files ready to upload.

use crate::error::Result;
use crate::types::CompressionCodec;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

/// Rows per Parquet row group
pub const ROW_GROUP_SIZE: usize = 1024 * 1024;

/// Configuration for Parquet writer
#[derive(Debug, Clone, Default)]
pub struct ParquetWriterConfig {
    codec: CompressionCodec,
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression codec
    #[must_use]
    pub fn with_codec(mut self, codec: CompressionCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Data file name for the n-th file of a partition
    ///
    /// e.g. `part-00000.snappy.parquet`
    pub fn file_name(&self, index: usize) -> String {
        match self.codec.file_infix() {
            Some(infix) => format!("part-{index:05}.{infix}.parquet"),
            None => format!("part-{index:05}.parquet"),
        }
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(Compression::from(self.codec))
            .set_max_row_group_size(ROW_GROUP_SIZE)
            .build()
    }
}

/// Encode a RecordBatch as a complete Parquet file in memory
pub fn encode_parquet(batch: &RecordBatch, config: &ParquetWriterConfig) -> Result<Bytes> {
    let mut buf = Vec::new();
    let props = config.build_properties();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(Bytes::from(buf))
}

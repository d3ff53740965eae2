//! JSON to Arrow conversion
//!
//! Converts decoded JSON records into Arrow RecordBatches against a declared
//! source schema. Values are coerced to the declared column type; anything
//! that cannot be coerced becomes null.

use crate::error::{Error, Result};
use crate::types::JsonObject;
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, NullArray, StringArray};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::sync::Arc;

/// Check that every required column appears in at least one record
///
/// A column that no record carries cannot be resolved, which is a fatal
/// input error. An empty input has nothing to check.
pub fn ensure_columns<'a, I>(records: I, columns: &[&str], source_name: &str) -> Result<()>
where
    I: IntoIterator<Item = &'a JsonObject> + Clone,
{
    if records.clone().into_iter().next().is_none() {
        return Ok(());
    }

    for column in columns {
        let present = records.clone().into_iter().any(|r| r.contains_key(*column));
        if !present {
            return Err(Error::missing_column(*column, source_name));
        }
    }
    Ok(())
}

/// Convert JSON records to an Arrow RecordBatch with the given schema
///
/// Keys absent from the schema are ignored; schema columns absent from a
/// record (or explicitly `null`) become null.
pub fn json_to_arrow(records: &[JsonObject], schema: &SchemaRef) -> Result<RecordBatch> {
    if records.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::clone(schema)));
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let values: Vec<Option<&Value>> = records
            .iter()
            .map(|record| record.get(field.name()).filter(|v| !v.is_null()))
            .collect();

        let array = build_array(&values, field.data_type())?;
        columns.push(array);
    }

    RecordBatch::try_new(Arc::clone(schema), columns).map_err(|e| Error::Output {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

/// Build an Arrow array from JSON values
fn build_array(values: &[Option<&Value>], data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Null => Ok(Arc::new(NullArray::new(values.len()))),

        DataType::Boolean => {
            let arr: BooleanArray = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Int64 => {
            let arr: Int64Array = values.iter().map(|v| v.and_then(as_integer)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Float64 => {
            let arr: Float64Array = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Ok(Arc::new(arr))
        }

        DataType::Utf8 => {
            let arr: StringArray = values
                .iter()
                .map(|v| {
                    v.map(|v| match v {
                        Value::String(s) => s.clone(),
                        _ => v.to_string(),
                    })
                })
                .collect();
            Ok(Arc::new(arr))
        }

        other => Err(Error::Output {
            message: format!("Unsupported source column type: {other}"),
        }),
    }
}

/// Integers, and floats with no fractional part, as i64
#[allow(clippy::cast_precision_loss)]
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

//! JSON record decoding

use crate::error::{Error, Result};
use crate::types::JsonObject;
use serde_json::{Deserializer, Value};

/// Decode every JSON object in a source file
///
/// `source` names the file in error messages. Any value that is not an
/// object (or an array of objects) is a malformed record.
pub fn decode_json_records(source: &str, body: &[u8]) -> Result<Vec<JsonObject>> {
    let mut records = Vec::new();

    let stream = Deserializer::from_slice(body).into_iter::<Value>();
    for (idx, value) in stream.enumerate() {
        let value = value.map_err(|e| {
            Error::input(source, format!("invalid JSON in value {}: {e}", idx + 1))
        })?;

        match value {
            Value::Object(obj) => records.push(obj),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(obj) => records.push(obj),
                        other => {
                            return Err(Error::input(
                                source,
                                format!("expected JSON object in array, found {}", kind(&other)),
                            ))
                        }
                    }
                }
            }
            other => {
                return Err(Error::input(
                    source,
                    format!("expected JSON object, found {}", kind(&other)),
                ))
            }
        }
    }

    Ok(records)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Synthetic row identifiers
//!
//! An id is `(unit << 33) + row`, where `unit` is the index of the unit of
//! work (one source file) and `row` the position inside it. Ids are unique
//! within a run and increase within a unit, but are neither contiguous nor
//! stable across changes to the input.

use crate::error::{Error, Result};
use arrow::array::Int64Array;

/// Bits reserved for the row position inside a unit
pub const ROW_BITS: u32 = 33;

/// Generate `len` consecutive ids for a unit of work
pub fn monotonic_ids(unit: u32, len: usize) -> Result<Int64Array> {
    if unit >= 1 << (63 - ROW_BITS) {
        return Err(Error::transform(format!("Unit index {unit} out of range")));
    }
    if len as u64 > 1u64 << ROW_BITS {
        return Err(Error::transform(format!(
            "Unit {unit} has too many rows for id assignment: {len}"
        )));
    }

    let base = i64::from(unit) << ROW_BITS;
    Ok(Int64Array::from_iter_values(
        (0..len as i64).map(|row| base + row),
    ))
}

use serde_json::Value;

use crate::model::{DecodedRow, RawRow, RowOutcome, SkipReason};

/// Parses a row's payload as a JSON object.
///
/// Loggers interleave partial writes, so a payload that is not a complete object is an
/// expected outcome and yields [`RowOutcome::Skipped`] rather than an error.
pub fn decode_payload(row: &RawRow) -> RowOutcome<DecodedRow> {
    match serde_json::from_str::<Value>(&row.payload) {
        Ok(Value::Object(fields)) => RowOutcome::Kept(DecodedRow {
            server_time: row.server_time,
            fields,
        }),
        _ => RowOutcome::Skipped(SkipReason::InvalidPayload),
    }
}

use telemux_parser::{decode_payload, DecodedRow, RawRow, RowOutcome, SkipReason};

use crate::calibration::Cell;
use crate::channels::Channel;
use crate::timestamp::{reconcile_timestamps, ClockPair};

/// A row in engineering units. `values` follows `channel.fields()` order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub server_ms: i64,
    pub logger_us: i64,
    pub values: Vec<Cell>,
}

/// Applies the channel's calibration table to an already decoded row.
pub fn normalize_row(channel: Channel, row: &DecodedRow) -> RowOutcome<NormalizedRow> {
    reconcile_timestamps(row).and_then(|clock| calibrate(channel, row, clock).into())
}

/// Decode, reconcile and calibrate one raw row of `channel`.
pub fn normalize_raw(channel: Channel, row: &RawRow) -> RowOutcome<NormalizedRow> {
    decode_payload(row).and_then(|decoded| normalize_row(channel, &decoded))
}

fn calibrate(
    channel: Channel,
    row: &DecodedRow,
    clock: ClockPair,
) -> Result<NormalizedRow, SkipReason> {
    let values = channel
        .fields()
        .iter()
        .map(|spec| {
            let raw = row.field(spec.raw).ok_or(SkipReason::MissingField)?;
            spec.calibration.apply(raw)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NormalizedRow {
        server_ms: clock.server_ms,
        logger_us: clock.logger_us,
        values,
    })
}

use telemux_parser::{DecodedRow, RowOutcome, SkipReason};

use crate::calibration::integer_value;

const MICROS_PER_SECOND: i64 = 1_000_000;

/// Server arrival time paired with the device clock.
///
/// `logger_us` counts microseconds since an arbitrary device epoch; it is only monotonic
/// within one log and is not comparable across devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockPair {
    pub server_ms: i64,
    pub logger_us: i64,
}

pub fn logger_micros(sec: i64, usec: i64) -> Option<i64> {
    sec.checked_mul(MICROS_PER_SECOND)?.checked_add(usec)
}

/// Reconciles the payload's `sec`/`usec` sub-fields with the row's server time.
pub fn reconcile_timestamps(row: &DecodedRow) -> RowOutcome<ClockPair> {
    let sec = row.field("sec").and_then(integer_value);
    let usec = row.field("usec").and_then(integer_value);

    let (Some(sec), Some(usec)) = (sec, usec) else {
        return RowOutcome::Skipped(SkipReason::MissingClock);
    };

    match logger_micros(sec, usec) {
        Some(logger_us) => RowOutcome::Kept(ClockPair {
            server_ms: row.server_time,
            logger_us,
        }),
        None => RowOutcome::Skipped(SkipReason::ClockOverflow),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn decoded(server_time: i64, payload: Value) -> DecodedRow {
        match payload {
            Value::Object(fields) => DecodedRow {
                server_time,
                fields,
            },
            other => panic!("expected object payload, got {other}"),
        }
    }

    #[test]
    fn combines_seconds_and_microseconds() {
        let row = decoded(1000, json!({"sec": 1, "usec": 500000}));
        assert_eq!(
            reconcile_timestamps(&row),
            RowOutcome::Kept(ClockPair {
                server_ms: 1000,
                logger_us: 1_500_000,
            })
        );
    }

    #[test]
    fn missing_or_non_integer_clock_is_skipped() {
        for payload in [
            json!({"usec": 5}),
            json!({"sec": 5}),
            json!({"sec": "5", "usec": 0}),
            json!({"sec": 1.5, "usec": 0}),
        ] {
            let row = decoded(1, payload);
            assert_eq!(
                reconcile_timestamps(&row),
                RowOutcome::Skipped(SkipReason::MissingClock)
            );
        }
    }

    #[test]
    fn overflowing_clock_is_skipped() {
        let row = decoded(1, json!({"sec": i64::MAX, "usec": 0}));
        assert_eq!(
            reconcile_timestamps(&row),
            RowOutcome::Skipped(SkipReason::ClockOverflow)
        );
    }
}

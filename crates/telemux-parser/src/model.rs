use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// One syntactically valid line of a raw log. `topic` and `payload` are kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub server_time: i64,
    pub topic: String,
    pub payload: String,
}

/// A row whose payload parsed as a structured record.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRow {
    pub server_time: i64,
    pub fields: Map<String, Value>,
}

impl DecodedRow {
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Why a row was filtered out. These are expected outcomes, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MalformedRow,
    InvalidServerTime,
    InvalidPayload,
    MissingClock,
    ClockOverflow,
    MissingField,
    NonNumericField,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MalformedRow => "malformed_row",
            SkipReason::InvalidServerTime => "invalid_server_time",
            SkipReason::InvalidPayload => "invalid_payload",
            SkipReason::MissingClock => "missing_clock",
            SkipReason::ClockOverflow => "clock_overflow",
            SkipReason::MissingField => "missing_field",
            SkipReason::NonNumericField => "non_numeric_field",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of pushing one row through a stage: either it survives or it is silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome<T> {
    Kept(T),
    Skipped(SkipReason),
}

impl<T> RowOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RowOutcome<U> {
        match self {
            RowOutcome::Kept(value) => RowOutcome::Kept(f(value)),
            RowOutcome::Skipped(reason) => RowOutcome::Skipped(reason),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> RowOutcome<U>) -> RowOutcome<U> {
        match self {
            RowOutcome::Kept(value) => f(value),
            RowOutcome::Skipped(reason) => RowOutcome::Skipped(reason),
        }
    }

    pub fn kept(self) -> Option<T> {
        match self {
            RowOutcome::Kept(value) => Some(value),
            RowOutcome::Skipped(_) => None,
        }
    }

    pub fn is_kept(&self) -> bool {
        matches!(self, RowOutcome::Kept(_))
    }
}

impl<T> From<Result<T, SkipReason>> for RowOutcome<T> {
    fn from(value: Result<T, SkipReason>) -> Self {
        match value {
            Ok(value) => RowOutcome::Kept(value),
            Err(reason) => RowOutcome::Skipped(reason),
        }
    }
}

/// Tally of dropped rows keyed by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SkipCounts {
    counts: BTreeMap<SkipReason, usize>,
}

impl SkipCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, reason: SkipReason) {
        *self.counts.entry(reason).or_insert(0) += 1;
    }

    /// Unwraps a row outcome, counting it when it was skipped.
    pub fn observe<T>(&mut self, outcome: RowOutcome<T>) -> Option<T> {
        match outcome {
            RowOutcome::Kept(value) => Some(value),
            RowOutcome::Skipped(reason) => {
                self.record(reason);
                None
            }
        }
    }

    pub fn get(&self, reason: SkipReason) -> usize {
        self.counts.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkipReason, usize)> + '_ {
        self.counts.iter().map(|(reason, count)| (*reason, *count))
    }

    pub fn merge(&mut self, other: &SkipCounts) {
        for (reason, count) in other.iter() {
            *self.counts.entry(reason).or_insert(0) += count;
        }
    }
}

impl fmt::Display for SkipCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return f.write_str("-");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(reason, count)| format!("{reason}={count}"))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// All syntactically valid rows of one log file, plus what the reader dropped.
#[derive(Debug, Clone, Default)]
pub struct RawLog {
    pub rows: Vec<RawRow>,
    pub skipped: SkipCounts,
}

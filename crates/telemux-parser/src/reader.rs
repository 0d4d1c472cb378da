use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::errors::ReadError;
use crate::model::{RawLog, RawRow, SkipReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnRole {
    ServerTime,
    Topic,
    Payload,
    Ignored,
}

#[derive(Debug, Clone, Copy)]
struct LogColumns {
    server_time: usize,
    topic: usize,
    payload: usize,
    width: usize,
}

impl LogColumns {
    fn classify_column(name: &str) -> ColumnRole {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("time") || trimmed.eq_ignore_ascii_case("server_time") {
            ColumnRole::ServerTime
        } else if trimmed.eq_ignore_ascii_case("topic") {
            ColumnRole::Topic
        } else if trimmed.eq_ignore_ascii_case("payload") {
            ColumnRole::Payload
        } else {
            ColumnRole::Ignored
        }
    }

    fn from_header(header: &StringRecord) -> Result<Self, ReadError> {
        let mut server_time = None;
        let mut topic = None;
        let mut payload = None;

        for (idx, name) in header.iter().enumerate() {
            let slot = match Self::classify_column(name) {
                ColumnRole::ServerTime => &mut server_time,
                ColumnRole::Topic => &mut topic,
                ColumnRole::Payload => &mut payload,
                ColumnRole::Ignored => continue,
            };
            // first occurrence wins
            slot.get_or_insert(idx);
        }

        Ok(Self {
            server_time: server_time.ok_or(ReadError::MissingColumn { column: "time" })?,
            topic: topic.ok_or(ReadError::MissingColumn { column: "topic" })?,
            payload: payload.ok_or(ReadError::MissingColumn { column: "payload" })?,
            width: header.len(),
        })
    }

    fn extract(&self, record: &StringRecord) -> Result<RawRow, SkipReason> {
        if record.len() != self.width {
            return Err(SkipReason::MalformedRow);
        }
        let server_time = record
            .get(self.server_time)
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or(SkipReason::InvalidServerTime)?;
        let topic = record.get(self.topic).ok_or(SkipReason::MalformedRow)?;
        let payload = record.get(self.payload).ok_or(SkipReason::MalformedRow)?;

        Ok(RawRow {
            server_time,
            topic: topic.to_string(),
            payload: payload.to_string(),
        })
    }
}

/// Reads a raw log from disk, dropping rows that are not syntactically usable.
pub fn read_log(path: &Path) -> Result<RawLog, ReadError> {
    debug!(path = %path.display(), "reading raw log");
    let file = File::open(path)?;
    read_log_from(BufReader::new(file))
}

/// Reads a raw log from any byte source. The first record must be the header row.
pub fn read_log_from<R: Read>(source: R) -> Result<RawLog, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let header = reader.headers()?.clone();
    let columns = LogColumns::from_header(&header)?;

    let mut log = RawLog::default();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) if is_row_level(&err) => {
                log.skipped.record(SkipReason::MalformedRow);
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        match columns.extract(&record) {
            Ok(row) => log.rows.push(row),
            Err(reason) => log.skipped.record(reason),
        }
    }

    Ok(log)
}

fn is_row_level(err: &csv::Error) -> bool {
    !matches!(err.kind(), csv::ErrorKind::Io(_))
}

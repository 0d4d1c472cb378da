use polars::prelude::{Column, DataFrame, NamedFrom, PolarsError, Series};
use thiserror::Error;

use crate::calibration::{Cell, ColumnKind};
use crate::channels::{Channel, LOGGER_US_COLUMN, SERVER_MS_COLUMN};
use crate::transform::NormalizedRow;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("{channel} row has {found} values, expected {expected}")]
    WidthMismatch {
        channel: Channel,
        expected: usize,
        found: usize,
    },
    #[error("{channel} column {column} received a value of the wrong type")]
    TypeMismatch {
        channel: Channel,
        column: &'static str,
    },
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

enum ColumnValues {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl ColumnValues {
    fn new(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Int => ColumnValues::Int(Vec::new()),
            ColumnKind::Float => ColumnValues::Float(Vec::new()),
        }
    }

    fn push(&mut self, cell: Cell) -> bool {
        match (self, cell) {
            (ColumnValues::Int(values), Cell::Int(v)) => values.push(v),
            (ColumnValues::Float(values), Cell::Float(v)) => values.push(v),
            _ => return false,
        }
        true
    }

    fn into_column(self, name: &'static str) -> Column {
        match self {
            ColumnValues::Int(values) => Series::new(name.into(), values).into(),
            ColumnValues::Float(values) => Series::new(name.into(), values).into(),
        }
    }
}

/// Accumulates normalized rows column-wise in the channel's fixed column order.
pub struct ChannelFrameBuilder {
    channel: Channel,
    server_ms: Vec<i64>,
    logger_us: Vec<i64>,
    values: Vec<ColumnValues>,
}

impl ChannelFrameBuilder {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            server_ms: Vec::new(),
            logger_us: Vec::new(),
            values: channel
                .fields()
                .iter()
                .map(|spec| ColumnValues::new(spec.kind()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.server_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.server_ms.is_empty()
    }

    pub fn push(&mut self, row: NormalizedRow) -> Result<(), FrameError> {
        if row.values.len() != self.values.len() {
            return Err(FrameError::WidthMismatch {
                channel: self.channel,
                expected: self.values.len(),
                found: row.values.len(),
            });
        }
        // check every cell before mutating so a bad row leaves columns aligned
        let fields = self.channel.fields();
        for (spec, cell) in fields.iter().zip(&row.values) {
            if spec.kind() != cell.kind() {
                return Err(FrameError::TypeMismatch {
                    channel: self.channel,
                    column: spec.column,
                });
            }
        }

        self.server_ms.push(row.server_ms);
        self.logger_us.push(row.logger_us);
        for (column, cell) in self.values.iter_mut().zip(row.values) {
            let pushed = column.push(cell);
            debug_assert!(pushed, "cell kinds checked above");
        }
        Ok(())
    }

    pub fn build(self) -> Result<DataFrame, FrameError> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.values.len() + 2);
        columns.push(Series::new(SERVER_MS_COLUMN.into(), self.server_ms).into());
        columns.push(Series::new(LOGGER_US_COLUMN.into(), self.logger_us).into());
        for (spec, values) in self.channel.fields().iter().zip(self.values) {
            columns.push(values.into_column(spec.column));
        }
        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_frame_in_schema_order() {
        let mut builder = ChannelFrameBuilder::new(Channel::Ecu);
        builder
            .push(NormalizedRow {
                server_ms: 1,
                logger_us: 2,
                values: vec![
                    Cell::Float(-26.8),
                    Cell::Float(1.2),
                    Cell::Float(0.5),
                    Cell::Int(3),
                ],
            })
            .expect("row fits schema");

        let df = builder.build().expect("frame builds");
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 6);
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(names, Channel::Ecu.columns());
    }

    #[test]
    fn empty_builder_yields_header_only_frame() {
        let df = ChannelFrameBuilder::new(Channel::Acc).build().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 28);
    }

    #[test]
    fn rejects_misaligned_rows() {
        let mut builder = ChannelFrameBuilder::new(Channel::Rpm);
        let err = builder
            .push(NormalizedRow {
                server_ms: 1,
                logger_us: 2,
                values: vec![Cell::Int(900)],
            })
            .unwrap_err();
        assert!(matches!(err, FrameError::TypeMismatch { column: "rpm", .. }));
        assert!(builder.is_empty());
    }
}

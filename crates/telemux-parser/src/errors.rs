use thiserror::Error;

/// File-level failures while reading a raw log. Row-level problems never surface here;
/// they are counted in [`crate::SkipCounts`] instead.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("header row is missing required column '{column}'")]
    MissingColumn { column: &'static str },
}

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use polars::prelude::{CsvWriter, DataFrame, SerWriter};

use crate::channels::Channel;
use crate::error::{PipelineError, Result};

/// `<output_dir>/<channel dir>/<input file name>`.
pub fn channel_output_path(output_dir: &Path, channel: Channel, input: &Path) -> Result<PathBuf> {
    let file_name = input
        .file_name()
        .ok_or_else(|| PipelineError::NoFileName(input.to_path_buf()))?;
    Ok(output_dir.join(channel.dir_name()).join(file_name))
}

/// Creates `dir` and its parents; an existing directory is not an error.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| PipelineError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Serializes a channel frame as CSV with a header row, replacing any previous file.
pub fn write_channel_frame(path: &Path, df: &mut DataFrame) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    CsvWriter::new(&mut writer).include_header(true).finish(df)?;
    writer.flush()?;
    Ok(())
}

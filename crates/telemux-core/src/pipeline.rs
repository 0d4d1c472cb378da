use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use serde::Serialize;
use telemux_parser::{read_log, select_topic, RawRow, SkipCounts};
use tracing::{debug, info, warn};

use crate::channels::Channel;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::frame::{ChannelFrameBuilder, FrameError};
use crate::outputs::{channel_output_path, write_channel_frame};
use crate::transform::normalize_raw;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Every configured channel was written.
    Processed,
    /// The log was read but at least one channel could not be written.
    Partial,
    /// The log could not be read at all.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: Channel,
    pub output_path: Option<PathBuf>,
    /// Rows whose topic matched the channel.
    pub topic_rows: usize,
    pub written_rows: usize,
    pub skipped: SkipCounts,
    pub error: Option<String>,
}

impl ChannelReport {
    fn new(channel: Channel) -> Self {
        Self {
            channel,
            output_path: None,
            topic_rows: 0,
            written_rows: 0,
            skipped: SkipCounts::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    /// Rows the reader dropped before any channel saw them.
    pub read_skips: SkipCounts,
    pub channels: Vec<ChannelReport>,
    pub error: Option<String>,
}

impl FileReport {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            status: FileStatus::Failed,
            read_skips: SkipCounts::new(),
            channels: Vec::new(),
            error: Some(message),
        }
    }

    pub fn written_rows(&self) -> usize {
        self.channels.iter().map(|c| c.written_rows).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|f| f.status != FileStatus::Processed)
    }

    pub fn written_rows(&self) -> usize {
        self.files.iter().map(FileReport::written_rows).sum()
    }
}

/// One channel's rows from a single log, ready to serialize.
pub struct ChannelFrame {
    pub frame: DataFrame,
    pub topic_rows: usize,
    pub skipped: SkipCounts,
}

/// Lists `<input_dir>/*.<extension>` in sorted order. Entries that cannot be inspected are
/// returned as errors so the caller can report them per file.
pub fn discover_inputs(config: &PipelineConfig) -> Result<Vec<glob::GlobResult>> {
    let dir = glob::Pattern::escape(&config.input_dir.to_string_lossy());
    let pattern = format!("{dir}/*.{}", config.extension);

    let mut entries: Vec<glob::GlobResult> = glob::glob(&pattern)?
        .filter(|entry| entry.as_ref().map_or(true, |path| path.is_file()))
        .collect();
    entries.sort_by(|a, b| entry_path(a).cmp(entry_path(b)));

    if entries.is_empty() {
        info!(pattern = %pattern, "no input logs matched");
    }
    Ok(entries)
}

fn entry_path(entry: &glob::GlobResult) -> &Path {
    match entry {
        Ok(path) => path,
        Err(err) => err.path(),
    }
}

fn unreadable_report(err: glob::GlobError) -> FileReport {
    let path = err.path().to_path_buf();
    warn!(path = %path.display(), error = %err, "input log is not accessible");
    FileReport::failed(&path, err.to_string())
}

/// Select, decode, reconcile and calibrate every row of `channel` in `rows`.
pub fn collect_channel(
    channel: Channel,
    rows: &[RawRow],
) -> std::result::Result<ChannelFrame, FrameError> {
    let mut builder = ChannelFrameBuilder::new(channel);
    let mut skipped = SkipCounts::new();
    let mut topic_rows = 0usize;

    for row in select_topic(rows, channel.topic()) {
        topic_rows += 1;
        if let Some(normalized) = skipped.observe(normalize_raw(channel, row)) {
            builder.push(normalized)?;
        }
    }

    Ok(ChannelFrame {
        frame: builder.build()?,
        topic_rows,
        skipped,
    })
}

fn write_channel(
    channel: Channel,
    rows: &[RawRow],
    input: &Path,
    output_dir: &Path,
    report: &mut ChannelReport,
) -> Result<PathBuf> {
    let mut collected = collect_channel(channel, rows)?;
    report.topic_rows = collected.topic_rows;
    report.skipped = collected.skipped;

    let path = channel_output_path(output_dir, channel, input)?;
    write_channel_frame(&path, &mut collected.frame)?;
    report.written_rows = collected.frame.height();
    Ok(path)
}

fn process_channel(
    channel: Channel,
    rows: &[RawRow],
    input: &Path,
    output_dir: &Path,
) -> ChannelReport {
    let mut report = ChannelReport::new(channel);
    match write_channel(channel, rows, input, output_dir, &mut report) {
        Ok(path) => {
            info!(
                channel = %channel,
                output = %path.display(),
                rows = report.written_rows,
                "wrote channel file"
            );
            if !report.skipped.is_empty() {
                debug!(channel = %channel, skipped = %report.skipped, "dropped rows");
            }
            report.output_path = Some(path);
        }
        Err(err) => {
            warn!(channel = %channel, input = %input.display(), error = %err, "channel write failed");
            report.written_rows = 0;
            report.error = Some(err.to_string());
        }
    }
    report
}

/// Runs every configured channel over one input log. Never fails: problems are recorded
/// in the returned report so the rest of the batch can proceed.
pub fn process_file(path: &Path, config: &PipelineConfig) -> FileReport {
    info!(path = %path.display(), "processing input log");

    let log = match read_log(path) {
        Ok(log) => log,
        Err(source) => {
            let err = PipelineError::Read {
                path: path.to_path_buf(),
                source,
            };
            warn!(error = %err, "input log could not be read");
            return FileReport::failed(path, err.to_string());
        }
    };
    if !log.skipped.is_empty() {
        debug!(path = %path.display(), skipped = %log.skipped, "reader dropped rows");
    }

    let channels: Vec<ChannelReport> = config
        .channels
        .iter()
        .map(|&channel| process_channel(channel, &log.rows, path, &config.output_dir))
        .collect();

    let status = if channels.iter().any(|c| c.error.is_some()) {
        FileStatus::Partial
    } else {
        FileStatus::Processed
    };

    FileReport {
        path: path.to_path_buf(),
        status,
        read_skips: log.skipped,
        channels,
        error: None,
    }
}

/// Processes every input log sequentially.
pub fn run_batch(config: &PipelineConfig) -> Result<BatchReport> {
    let mut report = BatchReport::default();
    for entry in discover_inputs(config)? {
        let file_report = match entry {
            Ok(path) => process_file(&path, config),
            Err(err) => unreadable_report(err),
        };
        report.files.push(file_report);
    }
    Ok(report)
}

/// Processes input logs on blocking worker threads, at most `config.jobs` at a time.
/// Reports come back in the same order as [`run_batch`].
#[cfg(feature = "runtime")]
pub async fn run_batch_concurrent(config: &PipelineConfig) -> Result<BatchReport> {
    use std::sync::Arc;

    use tokio::sync::Semaphore;
    use tokio::task::JoinSet;

    let entries = discover_inputs(config)?;
    let config = Arc::new(config.clone());
    let permits = Arc::new(Semaphore::new(config.jobs));
    let mut slots: Vec<Option<FileReport>> = (0..entries.len()).map(|_| None).collect();
    let mut tasks = JoinSet::new();

    for (idx, entry) in entries.into_iter().enumerate() {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                slots[idx] = Some(unreadable_report(err));
                continue;
            }
        };
        let config = Arc::clone(&config);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|err| PipelineError::Task(err.to_string()))?;
            let task_path = path.clone();
            let report = tokio::task::spawn_blocking(move || process_file(&task_path, &config))
                .await
                .unwrap_or_else(|err| FileReport::failed(&path, format!("worker task failed: {err}")));
            Ok::<_, PipelineError>((idx, report))
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (idx, report) = joined.map_err(|err| PipelineError::Task(err.to_string()))??;
        slots[idx] = Some(report);
    }

    Ok(BatchReport {
        files: slots.into_iter().flatten().collect(),
    })
}

use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use telemux_core::{
    all_channel_descriptors, run_batch, run_batch_concurrent, BatchReport, Channel, FileStatus,
    PipelineConfig,
};
use telemux_parser::{read_log, summarize_topics};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Demultiplex vehicle telemetry logs into per-channel CSV files", long_about = None)]
struct Cli {
    /// TOML configuration file (falls back to TELEMUX_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize every input log into per-channel output files
    Run(RunArgs),
    /// List the channels and their output columns
    Channels,
    /// Show per-topic row counts for a single raw log
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Directory containing raw logs
    #[arg(long)]
    input: Option<PathBuf>,
    /// Directory receiving one subdirectory per channel
    #[arg(long)]
    output: Option<PathBuf>,
    /// Restrict to a channel (repeatable); accepts `stroke_front` or `stroke/front`
    #[arg(long = "channel")]
    channels: Vec<Channel>,
    /// Number of logs processed concurrently
    #[arg(long)]
    jobs: Option<usize>,
    /// Write the batch report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Raw log to inspect
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Run(args) => handle_run(cli.config, args).await,
        Command::Channels => {
            print_channels();
            Ok(())
        }
        Command::Inspect(args) => handle_inspect(&args.file),
    };

    if let Err(err) = &outcome {
        error!(error = %format!("{err:#}"), "telemux failed");
    }
    outcome
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig> {
    dotenvy::dotenv().ok();

    let path = path.or_else(|| env::var_os("TELEMUX_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

async fn handle_run(config_path: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(input) = args.input {
        config.input_dir = input;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }
    if !args.channels.is_empty() {
        config.channels = args.channels;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    let config = config.validated().context("invalid run options")?;

    info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        jobs = config.jobs,
        "starting batch"
    );

    let report = if config.jobs > 1 {
        run_batch_concurrent(&config).await?
    } else {
        run_batch(&config)?
    };

    print_report(&report);

    if let Some(path) = args.report_json {
        write_report_json(&path, &report)?;
    }

    info!(
        files = report.files.len(),
        processed = report.count(FileStatus::Processed),
        partial = report.count(FileStatus::Partial),
        failed = report.count(FileStatus::Failed),
        rows = report.written_rows(),
        "batch finished"
    );

    if report.has_failures() {
        bail!(
            "{} of {} input logs were not fully processed",
            report.files.len() - report.count(FileStatus::Processed),
            report.files.len()
        );
    }
    Ok(())
}

fn status_label(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Processed => "processed",
        FileStatus::Partial => "partial",
        FileStatus::Failed => "failed",
    }
}

fn print_report(report: &BatchReport) {
    if report.files.is_empty() {
        println!("No input logs found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec![
        "file", "status", "channel", "topic rows", "written", "skipped", "error",
    ]);

    for file in &report.files {
        let name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.path.display().to_string());

        if file.channels.is_empty() {
            table.add_row(vec![
                name,
                status_label(file.status).to_string(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                file.read_skips.to_string(),
                file.error.clone().unwrap_or_default(),
            ]);
            continue;
        }

        for channel in &file.channels {
            table.add_row(vec![
                name.clone(),
                status_label(file.status).to_string(),
                channel.channel.to_string(),
                channel.topic_rows.to_string(),
                channel.written_rows.to_string(),
                channel.skipped.to_string(),
                channel.error.clone().unwrap_or_default(),
            ]);
        }
    }

    println!("{table}");
}

fn write_report_json(path: &Path, report: &BatchReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}

fn print_channels() {
    let mut table = Table::new();
    table.set_header(vec!["channel", "topic", "columns", "description"]);
    for descriptor in all_channel_descriptors() {
        table.add_row(vec![
            descriptor.dir_name.to_string(),
            descriptor.topic.to_string(),
            descriptor.columns.join(", "),
            descriptor.description.to_string(),
        ]);
    }
    println!("{table}");
}

fn handle_inspect(path: &Path) -> Result<()> {
    let log = read_log(path).with_context(|| format!("failed to read {}", path.display()))?;
    let summary = summarize_topics(&log);

    let mut table = Table::new();
    table.set_header(vec!["topic", "rows", "decodable", "channel"]);
    for entry in &summary {
        let channel = Channel::ALL
            .iter()
            .find(|c| c.topic() == entry.topic)
            .map(|c| c.dir_name())
            .unwrap_or("-");
        table.add_row(vec![
            entry.topic.clone(),
            entry.rows.to_string(),
            entry.decodable.to_string(),
            channel.to_string(),
        ]);
    }

    println!("{}", path.display());
    println!("{table}");
    println!(
        "{} rows read, {} dropped by the reader ({})",
        log.rows.len(),
        log.skipped.total(),
        log.skipped
    );
    Ok(())
}

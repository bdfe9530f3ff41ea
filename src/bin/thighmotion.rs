//! thighmotion CLI - Command-line interface for thighmotion
//!
//! Commands:
//! - extract: Compute features for one or more recordings (batch mode)
//! - validate: Validate recording documents
//! - config: Print the effective pipeline configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use thighmotion::pipeline::{process_batch, FeatureRow, RecordingFailure, RecordingOutcome};
use thighmotion::schema::{RecordingAdapter, RecordingInput};
use thighmotion::{PipelineConfig, PRODUCER_NAME, THIGHMOTION_VERSION};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// thighmotion - Activity features from thigh-worn accelerometer recordings
#[derive(Parser)]
#[command(name = "thighmotion")]
#[command(author = "Synheart AI Inc")]
#[command(version = THIGHMOTION_VERSION)]
#[command(about = "Compute activity and bout features from accelerometer recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute features for one or more recordings (batch mode)
    Extract {
        /// Input file paths (use - for stdin)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Write per-recording outcomes (including failures) to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Validate recording documents
    Validate {
        /// Input file paths (use - for stdin)
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective pipeline configuration as JSON
    Config {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(clap::Args)]
struct PipelineArgs {
    /// Load the pipeline configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling rate of the input series (Hz)
    #[arg(long)]
    sampling_rate: Option<f64>,

    /// SMA window length (seconds)
    #[arg(long)]
    window_length: Option<f64>,

    /// Activity threshold on window SMA
    #[arg(long)]
    activity_threshold: Option<f64>,

    /// High-pass cutoff frequency (Hz)
    #[arg(long)]
    cutoff: Option<f64>,

    /// High-pass filter order
    #[arg(long)]
    filter_order: Option<usize>,

    /// Skip high-pass filtering (input already has gravity removed)
    #[arg(long, conflicts_with_all = ["cutoff", "filter_order"])]
    no_filter: bool,
}

impl PipelineArgs {
    fn resolve(&self) -> Result<PipelineConfig, CliFailure> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json(&fs::read_to_string(path)?)?,
            None => PipelineConfig::default(),
        };

        if let Some(rate) = self.sampling_rate {
            config.sampling_rate_hz = rate;
        }
        if let Some(length) = self.window_length {
            config.window_length_s = length;
        }
        if let Some(threshold) = self.activity_threshold {
            config.activity_threshold = threshold;
        }

        if self.no_filter {
            config.high_pass = None;
        } else if self.cutoff.is_some() || self.filter_order.is_some() {
            let mut high_pass = config.high_pass.take().unwrap_or_default();
            if let Some(cutoff) = self.cutoff {
                high_pass.cutoff_hz = cutoff;
            }
            if let Some(order) = self.filter_order {
                high_pass.order = order;
            }
            config.high_pass = Some(high_pass);
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// A single recording or a JSON array of recordings
    Json,
    /// Newline-delimited JSON (one recording per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one feature row per line)
    Ndjson,
    /// JSON array of feature rows
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliFailure> {
    match cli.command {
        Commands::Extract {
            input,
            output,
            input_format,
            output_format,
            pipeline,
            report,
        } => cmd_extract(
            &input,
            &output,
            input_format,
            output_format,
            &pipeline,
            report.as_deref(),
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Config { pipeline } => {
            println!("{}", pipeline.resolve()?.to_json()?);
            Ok(())
        }
    }
}

fn read_input(path: &Path) -> Result<String, CliFailure> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_recordings(
    inputs: &[PathBuf],
    input_format: &InputFormat,
) -> Result<Vec<RecordingInput>, CliFailure> {
    let mut recordings = Vec::new();
    for path in inputs {
        let data = read_input(path)?;
        let parsed = match input_format {
            InputFormat::Json => RecordingAdapter::parse_json(&data)?,
            InputFormat::Ndjson => RecordingAdapter::parse_ndjson(&data)?,
        };
        info!(path = %path.display(), recordings = parsed.len(), "read input");
        recordings.extend(parsed);
    }

    if recordings.is_empty() {
        return Err(CliFailure::NoRecordings);
    }
    Ok(recordings)
}

fn cmd_extract(
    inputs: &[PathBuf],
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    pipeline: &PipelineArgs,
    report: Option<&Path>,
) -> Result<(), CliFailure> {
    let config = pipeline.resolve()?;
    let recordings = read_recordings(inputs, &input_format)?;

    let outcomes = process_batch(&recordings, &config)?;

    let rows: Vec<&FeatureRow> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            RecordingOutcome::Success(row) => Some(row),
            RecordingOutcome::Failure(_) => None,
        })
        .collect();
    let failures: Vec<&RecordingFailure> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            RecordingOutcome::Failure(failure) => Some(failure),
            RecordingOutcome::Success(_) => None,
        })
        .collect();

    for failure in &failures {
        eprintln!(
            "warning: {} ({}) skipped: {}",
            failure.recording_id,
            failure.side.as_str(),
            failure.reason
        );
    }

    if let Some(report_path) = report {
        let batch_report = BatchReport {
            producer: PRODUCER_NAME.to_string(),
            version: THIGHMOTION_VERSION.to_string(),
            config: config.clone(),
            total: outcomes.len(),
            succeeded: rows.len(),
            failed: failures.len(),
            outcomes: &outcomes,
        };
        fs::write(report_path, serde_json::to_string_pretty(&batch_report)?)?;
    }

    let output_data = format_output(&rows, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    if rows.is_empty() {
        return Err(CliFailure::AllFailed(failures.len()));
    }
    Ok(())
}

fn cmd_validate(
    inputs: &[PathBuf],
    input_format: InputFormat,
    json: bool,
) -> Result<(), CliFailure> {
    let recordings = read_recordings(inputs, &input_format)?;
    let results = RecordingAdapter::validate_recordings(&recordings);

    let report = ValidationReport {
        total_recordings: recordings.len(),
        valid_recordings: recordings.len() - results.len(),
        invalid_recordings: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                recording_id: r.recording_id.clone(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total recordings:   {}", report.total_recordings);
        println!("Valid recordings:   {}", report.valid_recordings);
        println!("Invalid recordings: {}", report.invalid_recordings);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Recording {} (index {}): {}",
                    err.recording_id, err.index, err.error
                );
            }
        }
    }

    if report.invalid_recordings > 0 {
        Err(CliFailure::ValidationFailed(report.invalid_recordings))
    } else {
        Ok(())
    }
}

fn format_output(rows: &[&FeatureRow], format: &OutputFormat) -> Result<String, CliFailure> {
    match format {
        OutputFormat::Ndjson => {
            let mut output = String::new();
            for row in rows {
                output.push_str(&serde_json::to_string(row)?);
                output.push('\n');
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string(rows)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(rows)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum CliFailure {
    Io(io::Error),
    Compute(thighmotion::ComputeError),
    Json(serde_json::Error),
    NoRecordings,
    AllFailed(usize),
    ValidationFailed(usize),
}

impl From<io::Error> for CliFailure {
    fn from(e: io::Error) -> Self {
        CliFailure::Io(e)
    }
}

impl From<thighmotion::ComputeError> for CliFailure {
    fn from(e: thighmotion::ComputeError) -> Self {
        CliFailure::Compute(e)
    }
}

impl From<serde_json::Error> for CliFailure {
    fn from(e: serde_json::Error) -> Self {
        CliFailure::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliFailure> for CliError {
    fn from(e: CliFailure) -> Self {
        match e {
            CliFailure::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliFailure::Compute(e) => CliError {
                code: "COMPUTE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches thigh.recording.v1 and the configuration is valid".to_string()),
            },
            CliFailure::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliFailure::NoRecordings => CliError {
                code: "NO_RECORDINGS".to_string(),
                message: "No recordings found in input".to_string(),
                hint: Some("Ensure input files are not empty".to_string()),
            },
            CliFailure::AllFailed(count) => CliError {
                code: "ALL_FAILED".to_string(),
                message: format!("All {} recordings failed", count),
                hint: Some("Use --report to see the reason for each recording".to_string()),
            },
            CliFailure::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} recordings failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct BatchReport<'a> {
    producer: String,
    version: String,
    config: PipelineConfig,
    total: usize,
    succeeded: usize,
    failed: usize,
    outcomes: &'a [RecordingOutcome],
}

#[derive(serde::Serialize)]
struct ValidationReport {
    total_recordings: usize,
    valid_recordings: usize,
    invalid_recordings: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    recording_id: String,
    error: String,
}

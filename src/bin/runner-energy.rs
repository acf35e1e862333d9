//! runner-energy CLI - Command-line interface for runner-energy
//!
//! Commands:
//! - summary: Load an experiment plan and print per-run metrics
//! - spectrum: Print the strongest power-spectrum peaks of each run
//! - export: Write one source's data in the canonical CSV layout

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use runner_energy::report::{self, SummaryReport, SummaryRow};
use runner_energy::{
    BatchLoader, EnergyError, EnergySourceAdapter, ExperimentPlan, LoadOutcome, SourceType,
    PRODUCER_NAME, RUNNER_ENERGY_VERSION,
};

/// runner-energy - Normalize device energy logs and derive comparable metrics
#[derive(Parser)]
#[command(name = "runner-energy")]
#[command(version = RUNNER_ENERGY_VERSION)]
#[command(about = "Derive energy metrics from battery-manager and wattmeter logs", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an experiment plan and print per-run metrics
    Summary {
        /// Experiment plan (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output format (defaults to table on a terminal, JSON otherwise)
        #[arg(long)]
        format: Option<SummaryFormat>,
    },

    /// Print the strongest power-spectrum peaks of each run
    Spectrum {
        /// Experiment plan (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Lowest frequency to consider (Hz)
        #[arg(long)]
        freq_min: Option<f64>,

        /// Highest frequency to consider (Hz)
        #[arg(long)]
        freq_max: Option<f64>,

        /// Number of peaks per run
        #[arg(long, default_value = "5")]
        top: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write one source's data in the canonical CSV layout
    Export {
        /// Source type (batterymanager, wattometer)
        #[arg(short, long, value_parser = parse_source)]
        source: SourceType,

        /// Data file or directory
        #[arg(short, long)]
        path: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
}

#[derive(Clone, ValueEnum)]
enum SummaryFormat {
    /// Aligned text table
    Table,
    /// Pretty-printed JSON report
    Json,
    /// CSV, one row per run
    Csv,
}

fn parse_source(s: &str) -> Result<SourceType, String> {
    s.parse::<SourceType>().map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), EnergyCliError> {
    match cli.command {
        Commands::Summary { config, format } => cmd_summary(&config, format),
        Commands::Spectrum {
            config,
            freq_min,
            freq_max,
            top,
            json,
        } => cmd_spectrum(&config, freq_min, freq_max, top, json),
        Commands::Export {
            source,
            path,
            output,
        } => cmd_export(source, &path, &output),
    }
}

fn load_plan(config: &Path) -> Result<LoadOutcome, EnergyCliError> {
    let plan = ExperimentPlan::from_path(config)?;
    let outcome = BatchLoader::new().load_plan(&plan);
    if outcome.records.is_empty() {
        return Err(EnergyCliError::NoExperiments(outcome.skipped.len()));
    }
    Ok(outcome)
}

fn cmd_summary(config: &Path, format: Option<SummaryFormat>) -> Result<(), EnergyCliError> {
    let outcome = load_plan(config)?;

    let format = format.unwrap_or(if atty::is(atty::Stream::Stdout) {
        SummaryFormat::Table
    } else {
        SummaryFormat::Json
    });

    let mut stdout = io::stdout();
    match format {
        SummaryFormat::Table => {
            let rows: Vec<SummaryRow> = outcome.records.iter().map(SummaryRow::from).collect();
            println!("Summary of Experiments:");
            print!("{}", report::render_table(&rows));
            if !outcome.skipped.is_empty() {
                println!("\nSkipped {} entries:", outcome.skipped.len());
                for entry in &outcome.skipped {
                    println!("  - [{}] {}: {}", entry.source, entry.path.display(), entry.message);
                }
            }
        }
        SummaryFormat::Json => {
            let summary = SummaryReport::from_outcome(&outcome);
            writeln!(stdout, "{}", summary.to_json()?)?;
        }
        SummaryFormat::Csv => {
            let rows: Vec<SummaryRow> = outcome.records.iter().map(SummaryRow::from).collect();
            report::write_summary_csv(&rows, &mut stdout)?;
        }
    }

    Ok(())
}

fn cmd_spectrum(
    config: &Path,
    freq_min: Option<f64>,
    freq_max: Option<f64>,
    top: usize,
    json: bool,
) -> Result<(), EnergyCliError> {
    let outcome = load_plan(config)?;

    let mut peaks_by_run = Vec::new();
    for record in &outcome.records {
        let peaks = record
            .power_spectrum()
            .map(|spectrum| (spectrum.sample_rate_hz, spectrum.peaks(top, freq_min, freq_max)));
        peaks_by_run.push(SpectrumPeaks {
            name: record.display_name().to_string(),
            source: record.source(),
            file: record.data_file_name().to_string(),
            sample_rate_hz: peaks.as_ref().map(|(rate, _)| *rate),
            peaks: peaks.map(|(_, bins)| bins).unwrap_or_default(),
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&peaks_by_run)?);
        return Ok(());
    }

    println!("Power spectrum peaks");
    println!("====================");
    for run in &peaks_by_run {
        println!(
            "\n{} [{}] {} (fs = {} Hz)",
            run.name,
            run.source,
            run.file,
            report::fmt_metric(run.sample_rate_hz, 3)
        );
        if run.peaks.is_empty() {
            println!("  {}", report::NOT_AVAILABLE);
        }
        for bin in &run.peaks {
            println!(
                "  {:>10.4} Hz  {:>10.6} W",
                bin.frequency_hz, bin.amplitude_watts
            );
        }
    }

    Ok(())
}

fn cmd_export(source: SourceType, path: &Path, output: &Path) -> Result<(), EnergyCliError> {
    let dataset = source.adapter().load(path)?;

    if output.to_string_lossy() == "-" {
        report::write_canonical_csv(&dataset, io::stdout().lock())?;
    } else {
        report::write_canonical_csv(&dataset, File::create(output)?)?;
    }

    tracing::info!(
        rows = dataset.len(),
        dropped = dataset.dropped_rows,
        file = %dataset.provenance.file_name,
        "exported canonical dataset"
    );
    Ok(())
}

#[derive(serde::Serialize)]
struct SpectrumPeaks {
    name: String,
    source: SourceType,
    file: String,
    sample_rate_hz: Option<f64>,
    peaks: Vec<runner_energy::spectrum::SpectrumBin>,
}

// Error types

#[derive(Debug)]
enum EnergyCliError {
    Io(io::Error),
    Energy(EnergyError),
    Json(serde_json::Error),
    NoExperiments(usize),
}

impl From<io::Error> for EnergyCliError {
    fn from(e: io::Error) -> Self {
        EnergyCliError::Io(e)
    }
}

impl From<EnergyError> for EnergyCliError {
    fn from(e: EnergyError) -> Self {
        EnergyCliError::Energy(e)
    }
}

impl From<serde_json::Error> for EnergyCliError {
    fn from(e: serde_json::Error) -> Self {
        EnergyCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    producer: &'static str,
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EnergyCliError> for CliError {
    fn from(e: EnergyCliError) -> Self {
        match e {
            EnergyCliError::Io(e) => CliError {
                producer: PRODUCER_NAME,
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EnergyCliError::Energy(e) => CliError {
                producer: PRODUCER_NAME,
                code: e.code().to_uppercase(),
                message: e.to_string(),
                hint: match e {
                    EnergyError::Config(_) | EnergyError::UnknownSource(_) => Some(
                        "source_type must be one of: batterymanager, wattometer".to_string(),
                    ),
                    EnergyError::NotFound(_) => {
                        Some("Point data_path at a CSV file or a directory containing one".to_string())
                    }
                    _ => None,
                },
            },
            EnergyCliError::Json(e) => CliError {
                producer: PRODUCER_NAME,
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EnergyCliError::NoExperiments(skipped) => CliError {
                producer: PRODUCER_NAME,
                code: "NO_EXPERIMENTS".to_string(),
                message: format!("No experiment could be loaded ({} skipped)", skipped),
                hint: Some("Run with --verbose to see why each entry was skipped".to_string()),
            },
        }
    }
}

//! dmslabel: dataset preparation for a driver-monitoring detector.
//!
//! Converts per-image driver-state annotations (eye and mouth state, phone
//! and cigarette presence) into YOLO label files, and splits an images +
//! labels tree into reproducible train/validation sets.
//!
//! # Modules
//!
//! - [`ir`]: annotation record, boxes, class map, JSON reader, YOLO label I/O
//! - [`rules`]: label derivation rules
//! - [`conversion`]: annotation tree -> label tree pipeline and report
//! - [`split`]: deterministic train/val split and report
//! - [`error`]: error types for dmslabel operations

pub mod conversion;
pub mod error;
pub mod ir;
pub mod rules;
pub mod split;
pub mod utils;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use error::DmsLabelError;

use conversion::ConvertOptions;
use ir::ClassMap;
use split::SplitOptions;

/// The dmslabel CLI application.
#[derive(Parser)]
#[command(name = "dmslabel")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Only log warnings and errors, and hide progress bars.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert annotation JSON files into YOLO label files.
    Convert(ConvertArgs),
    /// Split an images/labels tree into train and val sets.
    Split(SplitArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory searched recursively for annotation JSON files.
    #[arg(short, long)]
    annotations: PathBuf,

    /// Output directory for label files (deleted and recreated).
    #[arg(short, long)]
    output: PathBuf,

    /// Class names in id order.
    #[arg(long, value_delimiter = ',')]
    classes: Vec<String>,

    /// Exit non-zero if any annotation file was skipped.
    #[arg(long)]
    strict: bool,

    /// Report format.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Dataset directory containing images/ and labels/.
    dataset: PathBuf,

    /// Images directory (default: <DATASET>/images).
    #[arg(long)]
    images: Option<PathBuf>,

    /// Labels directory (default: <DATASET>/labels).
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Output directory (default: split_data next to <DATASET>; deleted and recreated).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fraction of images assigned to train, in (0, 1).
    #[arg(long, env = "DMSLABEL_TRAIN_RATIO", default_value_t = split::DEFAULT_TRAIN_RATIO)]
    train_ratio: f64,

    /// Seed for the shuffle.
    #[arg(long, env = "DMSLABEL_SEED", default_value_t = split::DEFAULT_SEED)]
    seed: u64,

    /// Image extension to include (repeatable; default: jpg, jpeg, png, bmp, webp).
    #[arg(long = "image-ext")]
    image_ext: Vec<String>,

    /// Fail if any image has no label file.
    #[arg(long)]
    require_labels: bool,

    /// Write data.yaml for the training tool into the output directory.
    #[arg(long)]
    data_yaml: bool,

    /// Class names in id order (used for data.yaml and class counts).
    #[arg(long, value_delimiter = ',')]
    classes: Vec<String>,

    /// Report format.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the dmslabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), DmsLabelError> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args, cli.quiet),
        Some(Commands::Split(args)) => run_split(args, cli.quiet),
        None => {
            println!("dmslabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Driver-monitoring dataset preparation.");
            println!();
            println!("Run 'dmslabel --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet { "warn" } else { "info" };
    // Ignore the error if a logger is already installed.
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("DMSLABEL_LOG", default_filter),
    )
    .try_init();
}

fn class_map_from_args(classes: &[String]) -> Result<ClassMap, DmsLabelError> {
    if classes.is_empty() {
        Ok(ClassMap::default())
    } else {
        ClassMap::from_names(classes)
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs, quiet: bool) -> Result<(), DmsLabelError> {
    let mut opts = ConvertOptions::new(args.annotations, args.output);
    opts.class_map = class_map_from_args(&args.classes)?;
    opts.show_progress = !quiet;

    let report = conversion::convert_dataset(&opts)?;
    print_report(&report, args.report)?;

    if args.strict && !report.is_complete() {
        return Err(DmsLabelError::ConversionFailed {
            skipped: report.counts.skipped,
        });
    }
    Ok(())
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs, quiet: bool) -> Result<(), DmsLabelError> {
    let images = args
        .images
        .unwrap_or_else(|| args.dataset.join("images"));
    let labels = args
        .labels
        .unwrap_or_else(|| args.dataset.join("labels"));
    let output = args
        .output
        .unwrap_or_else(|| default_split_output(&args.dataset));

    let mut opts = SplitOptions::new(images, labels, output);
    opts.train_ratio = args.train_ratio;
    opts.seed = args.seed;
    if !args.image_ext.is_empty() {
        opts.image_extensions = args.image_ext;
    }
    opts.require_labels = args.require_labels;
    opts.write_data_yaml = args.data_yaml;
    opts.class_map = class_map_from_args(&args.classes)?;
    opts.show_progress = !quiet;

    let report = split::split_dataset(&opts)?;
    print_report(&report, args.report)
}

/// `split_data` next to the dataset directory.
fn default_split_output(dataset: &Path) -> PathBuf {
    match dataset.parent() {
        Some(parent) => parent.join("split_data"),
        None => dataset.join("split_data"),
    }
}

fn print_report<R>(report: &R, format: ReportFormat) -> Result<(), DmsLabelError>
where
    R: std::fmt::Display + Serialize,
{
    match format {
        ReportFormat::Text => print!("{}", report),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|source| DmsLabelError::ReportSerialize { source })?;
            println!("{}", json);
        }
    }
    Ok(())
}

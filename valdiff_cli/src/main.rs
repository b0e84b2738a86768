use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use valdiff_common::{
    ensure_config, load_config, AppConfig, DiffSettings, ObjectMode, OutputFormat, StructuredDiff,
};
use valdiff_core::{load_document, Comparator, PolicyBuilder};

const EXIT_EQUAL: i32 = 0;
const EXIT_DIFFERENT: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "valdiff")]
#[command(author = "valdiff Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Structural comparison of JSON, YAML and TOML documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two documents and report every difference
    Compare(CompareArgs),

    /// Show the configuration file location and contents
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,

        /// Use the configuration file next to the executable
        #[arg(long)]
        portable: bool,
    },
}

#[derive(Args, Debug, Default)]
struct CompareArgs {
    /// Left document (.json, .yaml, .yml or .toml)
    left: PathBuf,

    /// Right document
    right: PathBuf,

    /// Treat numbers within this absolute difference as equal
    #[arg(short, long)]
    epsilon: Option<f64>,

    /// Extra band added to the epsilon to absorb float noise
    #[arg(long)]
    guard_band: Option<f64>,

    /// Compare structure only, ignoring type names
    #[arg(long)]
    ignore_type_names: bool,

    /// Object field whose value labels differences below it (can be specified multiple times)
    #[arg(short, long = "label")]
    labels: Vec<String>,

    /// Load objects as records (dotted paths, enables labels)
    #[arg(short, long)]
    records: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Print nothing; only the exit code reports the outcome
    #[arg(short, long)]
    quiet: bool,

    /// Use the configuration file next to the executable
    #[arg(long)]
    portable: bool,

    /// Disable ANSI colors in output
    #[arg(long)]
    no_color: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    left: String,
    right: String,
    equal: bool,
    differences: usize,
    diffs: &'a [StructuredDiff],
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Compare(args) => match run_compare(&args) {
            Ok(true) => EXIT_EQUAL,
            Ok(false) => EXIT_DIFFERENT,
            Err(e) => {
                error!("Compare failed: {:#}", e);
                EXIT_ERROR
            }
        },
        Commands::Config { init, portable } => match run_config(init, portable) {
            Ok(()) => EXIT_EQUAL,
            Err(e) => {
                error!("Config failed: {:#}", e);
                EXIT_ERROR
            }
        },
    };

    std::process::exit(code);
}

/// Returns whether the two documents are equal.
fn run_compare(args: &CompareArgs) -> Result<bool> {
    info!("Comparing:");
    info!("  Left:  {}", args.left.display());
    info!("  Right: {}", args.right.display());

    let loaded = load_config(args.portable)?;
    info!("Using config: {}", loaded.path.display());
    let config = loaded.config;

    let settings = merge_settings(&config.diff, args);
    let object_mode = if args.records {
        ObjectMode::Record
    } else {
        config.output.object_mode
    };
    let format = if args.json {
        OutputFormat::Json
    } else {
        config.output.format
    };

    if !settings.label_fields.is_empty() && object_mode == ObjectMode::Map {
        warn!("Labels are only captured from records; pass --records to enable them");
    }

    let policy = PolicyBuilder::from_settings(&settings)
        .build()
        .context("invalid comparison settings")?;
    let comparator = Comparator::new(policy);

    let left = load_document(&args.left, object_mode)
        .with_context(|| format!("failed to load {}", args.left.display()))?;
    let right = load_document(&args.right, object_mode)
        .with_context(|| format!("failed to load {}", args.right.display()))?;

    let report = comparator.diff_structured(&left, &right)?;
    info!("Found {} differences", report.len());
    let equal = report.is_equal();

    if args.quiet {
        return Ok(equal);
    }

    match format {
        OutputFormat::Json => {
            let json = build_json_report(args, &report.diffs);
            let output = serde_json::to_string_pretty(&json)?;
            println!("{output}");
        }
        OutputFormat::Text => {
            let use_color = !args.no_color && std::io::stdout().is_terminal();
            for diff in &report.diffs {
                println!("{}", format_line(diff, use_color));
            }
        }
    }

    Ok(equal)
}

fn run_config(init: bool, portable: bool) -> Result<()> {
    let loaded = if init {
        ensure_config(portable)?
    } else {
        load_config(portable)?
    };

    println!("# Config path: {}", loaded.path.display());
    if !loaded.exists {
        println!("# File does not exist; showing defaults");
    } else if init {
        println!("# Existing file left unchanged");
    }
    print!("{}", render_config(&loaded.config)?);
    Ok(())
}

fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).context("failed to serialize configuration")
}

/// Command-line flags take precedence over the configuration file.
fn merge_settings(base: &DiffSettings, args: &CompareArgs) -> DiffSettings {
    let mut settings = base.clone();
    if args.ignore_type_names {
        settings.ignore_type_names = true;
    }
    if let Some(epsilon) = args.epsilon {
        settings.numeric_epsilon = Some(epsilon);
    }
    if let Some(band) = args.guard_band {
        settings.guard_band = band;
    }
    for label in &args.labels {
        if !settings.label_fields.contains(label) {
            settings.label_fields.push(label.clone());
        }
    }
    settings
}

fn build_json_report<'a>(args: &CompareArgs, diffs: &'a [StructuredDiff]) -> JsonReport<'a> {
    JsonReport {
        left: args.left.to_string_lossy().to_string(),
        right: args.right.to_string_lossy().to_string(),
        equal: diffs.is_empty(),
        differences: diffs.len(),
        diffs,
    }
}

fn format_line(diff: &StructuredDiff, use_color: bool) -> String {
    if !use_color {
        return diff.to_line();
    }
    let (red, green, cyan, reset) = ("\x1b[31m", "\x1b[32m", "\x1b[36m", "\x1b[0m");
    let values = format!(
        "{red}{}{reset} != {green}{}{reset}",
        diff.value_a, diff.value_b
    );
    if diff.path.is_empty() {
        values
    } else {
        format!("{cyan}{}{reset}: {values}", diff.path)
    }
}

//! ctp - Cassandra table properties tool
//!
//! Validates declarative table property documents, diffs them against an
//! observed snapshot and prints the `ALTER TABLE` statements that would
//! bring the cluster in line.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Overrides the log filter chosen by `-v` (default: `warn`)
//!
//! Logs go to stderr; command output goes to `--output`.

use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use table_properties::reconcile::{DryRunExecutor, PlanOutcome, Reconciler, SnapshotSource};
use table_properties::value::{load_document, render_document};
use table_properties::{Normalizer, PropertyChange};

/// Manage Cassandra table properties declaratively
#[derive(Debug, Parser)]
#[command(name = "ctp")]
#[command(version)]
struct Cli {
    /// Property schema file (default: built-in Cassandra 4.x schema)
    #[arg(short, long, global = true)]
    schema: Option<PathBuf>,

    /// Output location. Use '-' for stdout
    #[arg(short, long, default_value = "-", global = true)]
    output: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the property schema in use
    Schema,

    /// Check a desired-state document against the schema
    Validate {
        desired: PathBuf,
    },

    /// List property changes between desired and observed state
    Diff {
        #[arg(long)]
        desired: PathBuf,
        #[arg(long)]
        observed: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Print the statements that would reconcile observed with desired
    Plan {
        #[arg(long)]
        desired: PathBuf,
        #[arg(long)]
        observed: PathBuf,
    },

    /// Write a desired-state document describing observed tables
    Export {
        #[arg(long)]
        observed: PathBuf,
        /// Tables to export (default: every non-system table in the snapshot)
        tables: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let reconciler = match cli.schema {
        Some(ref path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read schema file {:?}: {}", path, e))?;
            Reconciler::new(Normalizer::from_yaml(&content)?)
        }
        None => Reconciler::default(),
    };

    let mut output: Box<dyn Write> = if cli.output == "-" {
        Box::new(io::stdout())
    } else {
        Box::new(
            fs::File::create(&cli.output)
                .map_err(|e| format!("Failed to create output file {:?}: {}", cli.output, e))?,
        )
    };

    match cli.command {
        Command::Schema => {
            write!(output, "{}", reconciler.normalizer().schema().to_yaml()?)?;
        }
        Command::Validate { desired } => validate(&reconciler, &desired, &mut output)?,
        Command::Diff {
            desired,
            observed,
            format,
        } => diff(&reconciler, &desired, &observed, format, &mut output)?,
        Command::Plan { desired, observed } => plan(&reconciler, &desired, &observed, &mut output)?,
        Command::Export { observed, tables } => export(&reconciler, &observed, tables, &mut output)?,
    }

    output.flush()?;
    Ok(())
}

fn validate(reconciler: &Reconciler, desired: &Path, output: &mut dyn Write) -> Result<(), Box<dyn Error>> {
    let document = load_document(desired)?;
    let errors = reconciler.validate(&document);

    if errors.is_empty() {
        writeln!(output, "Validation successful: {} table(s)", document.len())?;
        return Ok(());
    }

    writeln!(output, "Validation errors:")?;
    for violations in &errors {
        for line in violations.to_string().lines() {
            writeln!(output, "  - {}", line)?;
        }
    }
    Err(format!("{} of {} table(s) failed validation", errors.len(), document.len()).into())
}

fn diff(
    reconciler: &Reconciler,
    desired: &Path,
    observed: &Path,
    format: Format,
    output: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    let document = load_document(desired)?;
    let source = SnapshotSource::load(observed, reconciler.normalizer().schema())?;
    let plan = reconciler.plan(&document, &source);

    match format {
        Format::Text => {
            for change in plan.changes() {
                writeln!(output, "{}", change)?;
            }
        }
        Format::Json => {
            let changes: Vec<&PropertyChange> = plan.changes().collect();
            writeln!(output, "{}", serde_json::to_string_pretty(&changes)?)?;
        }
    }

    let failures: Vec<_> = plan.failures().collect();
    for (table, err) in &failures {
        eprintln!("{}: {}", table, err);
    }
    if !failures.is_empty() {
        return Err(format!("{} table(s) could not be diffed", failures.len()).into());
    }
    Ok(())
}

fn plan(
    reconciler: &Reconciler,
    desired: &Path,
    observed: &Path,
    output: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    let document = load_document(desired)?;
    let source = SnapshotSource::load(observed, reconciler.normalizer().schema())?;
    let plan = reconciler.plan(&document, &source);

    for t in &plan.tables {
        if let PlanOutcome::Changes { ref changes, .. } = t.outcome {
            for change in changes {
                writeln!(output, "-- {}", change)?;
            }
        }
    }

    let mut executor = DryRunExecutor::new(output);
    let report = reconciler.apply(&plan, &mut executor);
    eprintln!("{}", report);

    if !report.is_success() {
        return Err(format!("{} table(s) failed", report.failed()).into());
    }
    Ok(())
}

fn export(
    reconciler: &Reconciler,
    observed: &Path,
    tables: Vec<String>,
    output: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    let source = SnapshotSource::load(observed, reconciler.normalizer().schema())?;
    let tables = if tables.is_empty() { source.tables() } else { tables };

    let exported = reconciler.export(&tables, &source);
    write!(output, "{}", render_document(&exported.document)?)?;

    for (table, err) in &exported.failures {
        eprintln!("{}: {}", table, err);
    }
    if !exported.failures.is_empty() {
        return Err(format!("{} table(s) could not be exported", exported.failures.len()).into());
    }
    Ok(())
}

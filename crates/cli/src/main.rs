// cinefill - fill gaps in a movie catalog from external sources

mod exit_codes;
mod report;
mod sources;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use cinefill_enrich::{audit, driver, CatalogStore, DriverConfig, EnrichError, RunStats};

use exit_codes::{EXIT_INPUT, EXIT_OUTPUT, EXIT_REPLAY_INPUT, EXIT_SUCCESS, EXIT_USAGE};
use report::{ConsoleSink, Verbosity};
use sources::SourceKind;

#[derive(Parser)]
#[command(name = "cinefill")]
#[command(about = "Fill missing fields in a Shift_JIS movie catalog CSV from external sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch details from a source and merge them into absent fields
    #[command(after_help = "\
Examples:
  cinefill fill --source eiga --input movies.csv --output movies_filled.csv
  cinefill fill --source yahoo -i movies.csv -o out.csv --limit 50 --wait 1.0
  cinefill fill --source filmarks -i movies.csv -o out.csv --no-sentinel -v")]
    Fill {
        /// Which site to query
        #[arg(long, value_enum)]
        source: SourceKind,

        /// Catalog CSV (Shift_JIS)
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Where to write the updated catalog (Shift_JIS)
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Maximum candidates to process
        #[arg(long, default_value_t = 9999)]
        limit: usize,

        /// Seconds between candidates (default depends on source)
        #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
        wait: Option<f64>,

        /// Audit file path (default: MovieData_<source>_<timestamp>.json)
        #[arg(long)]
        audit: Option<PathBuf>,

        /// Leave year absent when the source has none, instead of
        /// writing the 1800 placeholder
        #[arg(long)]
        no_sentinel: bool,

        /// Only report errors
        #[arg(long, short = 'q')]
        quiet: bool,

        /// Per-candidate progress
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// Re-apply payloads from a previous run's audit file, without the network
    #[command(after_help = "\
Examples:
  cinefill replay MovieData_eigacom_20260829120000.json -i movies.csv -o out.csv")]
    Replay {
        /// Audit JSON from a previous fill run
        payloads: PathBuf,

        /// Catalog CSV (Shift_JIS)
        #[arg(long, short = 'i')]
        input: PathBuf,

        /// Where to write the updated catalog (Shift_JIS)
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Only report errors
        #[arg(long, short = 'q')]
        quiet: bool,

        /// Per-record progress
        #[arg(long, short = 'v')]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fill {
            source,
            input,
            output,
            limit,
            wait,
            audit,
            no_sentinel,
            quiet,
            verbose,
        } => cmd_fill(
            source, input, output, limit, wait, audit, no_sentinel, quiet, verbose,
        ),
        Commands::Replay {
            payloads,
            input,
            output,
            quiet,
            verbose,
        } => cmd_replay(payloads, input, output, quiet, verbose),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            eprintln!("error: {}", message);
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ── Commands ────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn cmd_fill(
    source: SourceKind,
    input: PathBuf,
    output: PathBuf,
    limit: usize,
    wait: Option<f64>,
    audit_path: Option<PathBuf>,
    no_sentinel: bool,
    quiet: bool,
    verbose: bool,
) -> Result<(), CliError> {
    let delay = resolve_wait(source, wait)?;
    let mut store = load_catalog(&input)?;
    store.ensure_columns();

    let config = DriverConfig {
        limit,
        delay,
        sentinel_year: !no_sentinel,
    };
    let fetcher = source.build();
    let mut sink = ConsoleSink::new(Verbosity::from_flags(quiet, verbose));

    let (entries, stats) = driver::run_fetch(&config, &mut store, fetcher.as_ref(), &mut sink);

    if !entries.is_empty() {
        let path = audit_path.unwrap_or_else(|| default_audit_path(source));
        audit::save_audit(&entries, &path).map_err(CliError::output)?;
        if !quiet {
            eprintln!("audit: {} payloads saved to {}", entries.len(), path.display());
        }
    }

    store.save(&output).map_err(CliError::output)?;
    print_summary(&stats, &output, quiet);
    Ok(())
}

fn cmd_replay(
    payloads: PathBuf,
    input: PathBuf,
    output: PathBuf,
    quiet: bool,
    verbose: bool,
) -> Result<(), CliError> {
    let entries = audit::load_audit(&payloads).map_err(CliError::replay_input)?;
    let mut store = load_catalog(&input)?;
    store.ensure_columns();

    let mut sink = ConsoleSink::new(Verbosity::from_flags(quiet, verbose));
    let stats = driver::run_replay(&mut store, &entries, &mut sink);

    store.save(&output).map_err(CliError::output)?;
    print_summary(&stats, &output, quiet);
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

fn resolve_wait(source: SourceKind, wait: Option<f64>) -> Result<Duration, CliError> {
    match wait {
        None => Ok(source.default_wait()),
        Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(Duration::from_secs_f64(secs)),
        Some(secs) => Err(CliError::usage(format!(
            "--wait must be a non-negative number of seconds, got {secs}"
        ))),
    }
}

fn load_catalog(path: &Path) -> Result<CatalogStore, CliError> {
    CatalogStore::load(path).map_err(|e| match e {
        EnrichError::NotFound(_) => CliError::input(e.to_string())
            .with_hint("the catalog must be an existing Shift_JIS CSV with movie_id and title columns"),
        other => CliError::input(other.to_string()),
    })
}

fn default_audit_path(source: SourceKind) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    PathBuf::from(format!("MovieData_{}_{stamp}.json", source.file_tag()))
}

fn print_summary(stats: &RunStats, output: &Path, quiet: bool) {
    if quiet {
        return;
    }
    eprintln!(
        "done: {} candidates, {} payloads, {} records updated, {} fetch failures",
        stats.candidates, stats.payloads, stats.updated, stats.fetch_failures
    );
    eprintln!("wrote {}", output.display());
}

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT, message: msg.into(), hint: None }
    }

    pub fn replay_input(err: EnrichError) -> Self {
        Self { code: EXIT_REPLAY_INPUT, message: err.to_string(), hint: None }
    }

    pub fn output(err: EnrichError) -> Self {
        Self { code: EXIT_OUTPUT, message: err.to_string(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ── Tests ───────────────────────────────────────────────────────────

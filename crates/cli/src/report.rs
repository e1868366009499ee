//! Console rendering of engine events.

use cinefill_enrich::{Event, ReportSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Renders engine events to stderr. Warnings always print unless quiet;
/// per-candidate progress prints only with `--verbose`.
pub struct ConsoleSink {
    verbosity: Verbosity,
}

impl ConsoleSink {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn warn(&self, message: String) {
        if self.verbosity > Verbosity::Quiet {
            eprintln!("warning: {message}");
        }
    }

    fn progress(&self, message: String) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{message}");
        }
    }

    fn info(&self, message: String) {
        if self.verbosity > Verbosity::Quiet {
            eprintln!("{message}");
        }
    }
}

impl ReportSink for ConsoleSink {
    fn emit(&mut self, event: Event) {
        match event {
            Event::CandidateStarted { movie_id, title } => {
                self.progress(format!("processing {title} (id {movie_id})"));
            }
            Event::SearchMiss { movie_id, title } => {
                self.warn(format!("no search result for {title} (id {movie_id})"));
            }
            Event::FetchFailed { movie_id, title, detail } => {
                self.warn(format!("fetch failed for {title} (id {movie_id}): {detail}"));
            }
            Event::SourceNote { source, detail } => {
                self.progress(format!("[{source}] {detail}"));
            }
            Event::RecordUpdated { movie_id, changes, .. } => {
                let summary: Vec<String> = changes
                    .iter()
                    .map(|c| format!("{}:{}", c.field, c.display))
                    .collect();
                self.info(format!("updated {movie_id}: {}", summary.join(", ")));
            }
            Event::RecordUnchanged { movie_id } => {
                self.progress(format!("no new data for {movie_id}"));
            }
            Event::RecordMissing { movie_id } => {
                self.warn(format!("movie_id {movie_id} not in catalog, skipped"));
            }
            Event::CoercionFailed { movie_id, field, detail } => {
                self.warn(format!("{movie_id}: skipped field '{field}' ({detail})"));
            }
            Event::SentinelYearWritten { movie_id } => {
                self.warn(format!(
                    "{movie_id}: no year found, wrote placeholder 1800"
                ));
            }
            Event::ReplayEntrySkipped { title } => {
                self.warn(format!("replay entry without movie_id skipped ({title})"));
            }
        }
    }
}

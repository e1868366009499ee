//! Reconciliation pass orchestration.
//!
//! Two mutually exclusive input modes: a fetch pass pulls payloads from an
//! external source through [`MovieDetailsFetcher`]; a replay pass consumes
//! payloads saved by a previous run's audit file. Per-candidate failures
//! are reported and skipped — only input-loading problems abort a run.

use std::fmt;
use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::error::EnrichError;
use crate::merge::{merge_payload, MergePolicy};
use crate::model::{AuditEntry, CatalogRecord, DetailsPayload};
use crate::report::{Event, ReportSink};
use crate::store::CatalogStore;

// ---------------------------------------------------------------------------
// External fetcher contract
// ---------------------------------------------------------------------------

/// Reference to a source page for one title, as returned by search.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRef(pub String);

/// Network/timeout failure from a source adapter. Recovered per
/// candidate, never fatal to the run.
#[derive(Debug)]
pub struct FetchError(pub String);

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FetchError {}

/// One external movie-information source. Implementations live outside
/// the engine; their extraction rules are site-specific data.
pub trait MovieDetailsFetcher {
    /// Source identifier recorded in payloads (e.g. `eiga.com`).
    fn source(&self) -> &str;

    /// Find the detail page for a title. `Ok(None)` means the source has
    /// no result; `Err` is a network-level failure.
    fn search(&self, title: &str) -> Result<Option<PageRef>, FetchError>;

    /// Extract details from a page. Never fails hard: on any internal
    /// error it reports through the sink and returns an all-absent
    /// payload.
    fn fetch_details(&self, page: &PageRef, sink: &mut dyn ReportSink) -> DetailsPayload;
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Maximum candidates per pass.
    pub limit: usize,
    /// Fixed, non-adaptive delay between candidates.
    pub delay: Duration,
    /// Write the sentinel year when a live attempt leaves `year` absent.
    pub sentinel_year: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            limit: 9999,
            delay: Duration::from_millis(200),
            sentinel_year: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    /// Candidates selected for this pass.
    pub candidates: usize,
    /// Non-empty payloads obtained (accumulated for the audit file).
    pub payloads: usize,
    /// Records actually mutated — a payload whose target fields were all
    /// populated already does not count.
    pub updated: usize,
    /// Per-candidate search/fetch failures (run continued).
    pub fetch_failures: usize,
}

/// Candidate predicate: one of the tracked fields is absent.
pub fn needs_enrichment(record: &CatalogRecord) -> bool {
    record.is_absent("year") || record.is_absent("director") || record.is_absent("summary")
}

/// Run a fetch pass: select candidates, query the source for each, merge,
/// and accumulate non-empty payloads for audit persistence.
pub fn run_fetch(
    config: &DriverConfig,
    store: &mut CatalogStore,
    fetcher: &dyn MovieDetailsFetcher,
    sink: &mut dyn ReportSink,
) -> (Vec<AuditEntry>, RunStats) {
    let ids = store.select_candidates(needs_enrichment, config.limit);
    let mut stats = RunStats {
        candidates: ids.len(),
        ..RunStats::default()
    };
    let mut audit: Vec<AuditEntry> = Vec::new();
    let policy = MergePolicy {
        sentinel_year: config.sentinel_year,
    };

    for (i, movie_id) in ids.iter().enumerate() {
        // Fixed inter-candidate delay, skipped after the last one.
        let wait = |i: usize| {
            if i + 1 < ids.len() && !config.delay.is_zero() {
                thread::sleep(config.delay);
            }
        };

        let Some(record) = store.lookup(movie_id) else {
            sink.emit(Event::RecordMissing { movie_id: movie_id.clone() });
            wait(i);
            continue;
        };
        let title = record.title.clone();
        sink.emit(Event::CandidateStarted {
            movie_id: movie_id.clone(),
            title: title.clone(),
        });

        let payload = match fetcher.search(&title) {
            Ok(Some(page)) => fetcher.fetch_details(&page, sink),
            Ok(None) => {
                sink.emit(Event::SearchMiss {
                    movie_id: movie_id.clone(),
                    title: title.clone(),
                });
                // Not-found still counts as a live attempt: the merge
                // below may write the sentinel year.
                DetailsPayload::new(fetcher.source())
            }
            Err(err) => {
                stats.fetch_failures += 1;
                sink.emit(Event::FetchFailed {
                    movie_id: movie_id.clone(),
                    title: title.clone(),
                    detail: err.to_string(),
                });
                wait(i);
                continue;
            }
        };

        if !payload.is_empty() {
            stats.payloads += 1;
            audit.push(AuditEntry {
                movie_id: movie_id.clone(),
                title: title.clone(),
                payload: payload.clone(),
            });
        }

        let Some(record) = store.lookup_mut(movie_id) else {
            sink.emit(Event::RecordMissing { movie_id: movie_id.clone() });
            wait(i);
            continue;
        };
        let outcome = merge_payload(record, &payload, &policy, sink);
        if outcome.changed {
            stats.updated += 1;
            sink.emit(Event::RecordUpdated {
                movie_id: movie_id.clone(),
                title,
                changes: outcome.changes,
            });
        } else {
            sink.emit(Event::RecordUnchanged { movie_id: movie_id.clone() });
        }

        wait(i);
    }

    (audit, stats)
}

/// Run a replay pass over previously saved payloads. No fetcher, no
/// delay, and never a sentinel write.
pub fn run_replay(
    store: &mut CatalogStore,
    entries: &[AuditEntry],
    sink: &mut dyn ReportSink,
) -> RunStats {
    let mut stats = RunStats {
        candidates: entries.len(),
        payloads: entries.len(),
        ..RunStats::default()
    };
    let policy = MergePolicy::default();

    for entry in entries {
        if entry.movie_id.is_empty() {
            sink.emit(Event::ReplayEntrySkipped {
                title: entry.title.clone(),
            });
            continue;
        }
        let Some(record) = store.lookup_mut(&entry.movie_id) else {
            sink.emit(Event::RecordMissing {
                movie_id: entry.movie_id.clone(),
            });
            continue;
        };

        let outcome = merge_payload(record, &entry.payload, &policy, sink);
        if outcome.changed {
            stats.updated += 1;
            sink.emit(Event::RecordUpdated {
                movie_id: entry.movie_id.clone(),
                title: entry.title.clone(),
                changes: outcome.changes,
            });
        } else {
            sink.emit(Event::RecordUnchanged {
                movie_id: entry.movie_id.clone(),
            });
        }
    }

    stats
}

/// Parse replay input. Fatal unless the document is a JSON array of
/// mapping objects.
pub fn parse_replay(text: &str) -> Result<Vec<AuditEntry>, EnrichError> {
    let doc: Value =
        serde_json::from_str(text).map_err(|e| EnrichError::InvalidReplayInput(e.to_string()))?;
    let Value::Array(items) = doc else {
        return Err(EnrichError::InvalidReplayInput(
            "expected a JSON array of payload objects".into(),
        ));
    };

    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            return Err(EnrichError::InvalidReplayInput(format!(
                "element {i} is not a mapping object"
            )));
        }
        let entry: AuditEntry = serde_json::from_value(item)
            .map_err(|e| EnrichError::InvalidReplayInput(format!("element {i}: {e}")))?;
        entries.push(entry);
    }
    Ok(entries)
}

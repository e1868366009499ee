//! Structured run events, emitted through an injected sink instead of a
//! process-global logger. The CLI renders them to stderr; tests collect
//! them with [`VecSink`].

use crate::merge::FieldChange;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CandidateStarted { movie_id: String, title: String },
    /// The source's search returned no page for this title.
    SearchMiss { movie_id: String, title: String },
    /// Network/timeout failure for one candidate; the run continues.
    FetchFailed { movie_id: String, title: String, detail: String },
    /// Extraction noise from a source adapter (partial page, bad markup).
    SourceNote { source: String, detail: String },
    RecordUpdated { movie_id: String, title: String, changes: Vec<FieldChange> },
    RecordUnchanged { movie_id: String },
    /// Payload referenced an identifier the catalog does not hold.
    RecordMissing { movie_id: String },
    /// A field value failed coercion and was skipped.
    CoercionFailed { movie_id: String, field: &'static str, detail: String },
    SentinelYearWritten { movie_id: String },
    /// Replay entry without a usable movie_id.
    ReplayEntrySkipped { title: String },
}

pub trait ReportSink {
    fn emit(&mut self, event: Event);
}

/// Discards everything.
pub struct NullSink;

impl ReportSink for NullSink {
    fn emit(&mut self, _event: Event) {}
}

/// Collects events in order; test helper.
#[derive(Default)]
pub struct VecSink(pub Vec<Event>);

impl ReportSink for VecSink {
    fn emit(&mut self, event: Event) {
        self.0.push(event);
    }
}

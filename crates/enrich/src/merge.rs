//! Field-by-field merge of a [`DetailsPayload`] into a [`CatalogRecord`].
//!
//! Policy: first successful write wins. A field is updated only when the
//! record's value is absent and the payload provides one; no source ever
//! supersedes an existing value. Coercion failures degrade to "field left
//! unchanged" plus a sink event — this function never fails.

use crate::coerce;
use crate::model::{CatalogRecord, DetailsPayload, ENRICHABLE_FIELDS, SENTINEL_YEAR};
use crate::report::{Event, ReportSink};

/// Per-pass merge options.
#[derive(Debug, Clone, Default)]
pub struct MergePolicy {
    /// Write [`SENTINEL_YEAR`] when `year` is still absent after the
    /// walk. Enabled only for live fetch passes, never for replay.
    pub sentinel_year: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: &'static str,
    /// Short display form for logging, truncated to 30 chars.
    pub display: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub changed: bool,
    pub changes: Vec<FieldChange>,
}

/// Apply `payload` to `record` under the "absent wins" policy. Walks the
/// schema field list in order; returns what changed.
pub fn merge_payload(
    record: &mut CatalogRecord,
    payload: &DetailsPayload,
    policy: &MergePolicy,
    sink: &mut dyn ReportSink,
) -> MergeOutcome {
    let mut changes = Vec::new();

    for spec in &ENRICHABLE_FIELDS {
        if !record.is_absent(spec.name) {
            continue;
        }
        let Some(value) = payload.field(spec) else {
            continue;
        };
        match coerce::to_storage(&value) {
            Ok(stored) => {
                let display = short_display(&stored);
                record.set(spec.name, stored);
                // set() drops empty coerced text; only count real writes
                if !record.is_absent(spec.name) {
                    changes.push(FieldChange { field: spec.name, display });
                }
            }
            Err(err) => {
                sink.emit(Event::CoercionFailed {
                    movie_id: record.movie_id.clone(),
                    field: spec.name,
                    detail: err.to_string(),
                });
            }
        }
    }

    if policy.sentinel_year && record.is_absent("year") {
        record.set("year", SENTINEL_YEAR.to_string());
        changes.push(FieldChange {
            field: "year",
            display: SENTINEL_YEAR.to_string(),
        });
        sink.emit(Event::SentinelYearWritten {
            movie_id: record.movie_id.clone(),
        });
    }

    MergeOutcome {
        changed: !changes.is_empty(),
        changes,
    }
}

fn short_display(value: &str) -> String {
    const MAX: usize = 30;
    if value.chars().count() <= MAX {
        return value.to_string();
    }
    let cut: String = value.chars().take(MAX - 3).collect();
    format!("{cut}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::VecSink;
    use serde_json::json;

    fn payload_2004() -> DetailsPayload {
        let mut p = DetailsPayload::new("eiga.com");
        p.year = Some(json!(2004));
        p.director = Some("山田太郎".into());
        p.runtime = Some(json!("118"));
        p
    }

    #[test]
    fn absent_field_completion() {
        let mut record = CatalogRecord::new("001", "A Film");
        let mut sink = VecSink::default();
        let outcome = merge_payload(&mut record, &payload_2004(), &MergePolicy::default(), &mut sink);

        assert!(outcome.changed);
        assert_eq!(record.year(), Some(2004));
        assert_eq!(record.get("director"), Some("山田太郎"));
        assert_eq!(record.runtime(), Some(118));
        let fields: Vec<_> = outcome.changes.iter().map(|c| c.field).collect();
        assert_eq!(fields, vec!["year", "director", "runtime"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut record = CatalogRecord::new("001", "A Film");
        let payload = payload_2004();
        let mut sink = VecSink::default();

        merge_payload(&mut record, &payload, &MergePolicy::default(), &mut sink);
        let first = record.clone();
        let second = merge_payload(&mut record, &payload, &MergePolicy::default(), &mut sink);

        assert!(!second.changed, "second merge must be a no-op");
        assert_eq!(record.year(), first.year());
        assert_eq!(record.get("director"), first.get("director"));
    }

    #[test]
    fn merge_never_overwrites_present_values() {
        let mut record = CatalogRecord::new("001", "A Film");
        record.set("year", "1954");
        record.set("director", "既存監督");

        let mut sink = VecSink::default();
        let outcome = merge_payload(&mut record, &payload_2004(), &MergePolicy::default(), &mut sink);

        assert_eq!(record.year(), Some(1954));
        assert_eq!(record.get("director"), Some("既存監督"));
        // runtime was absent, so it still fills in
        assert_eq!(record.runtime(), Some(118));
        assert!(outcome.changed);
        assert_eq!(outcome.changes.len(), 1);
    }

    #[test]
    fn numeric_coercion_failure_is_isolated() {
        let mut record = CatalogRecord::new("001", "A Film");
        let mut payload = payload_2004();
        payload.runtime = Some(json!("unknown"));

        let mut sink = VecSink::default();
        merge_payload(&mut record, &payload, &MergePolicy::default(), &mut sink);

        assert!(record.is_absent("runtime"));
        // other fields unaffected
        assert_eq!(record.year(), Some(2004));
        assert!(sink.0.iter().any(|e| matches!(
            e,
            Event::CoercionFailed { field: "runtime", .. }
        )));
    }

    #[test]
    fn unsupported_structured_type_is_skipped() {
        let mut record = CatalogRecord::new("001", "A Film");
        let mut payload = DetailsPayload::new("eiga.com");
        payload.full_staff = Some(json!("not a mapping"));

        let mut sink = VecSink::default();
        let outcome = merge_payload(&mut record, &payload, &MergePolicy::default(), &mut sink);

        assert!(!outcome.changed);
        assert!(record.is_absent("full_staff"));
        assert!(sink.0.iter().any(|e| matches!(
            e,
            Event::CoercionFailed { field: "full_staff", .. }
        )));
    }

    #[test]
    fn structured_round_trip() {
        let cast = json!([
            {"name": "A", "role": "X"},
            {"name": "B", "role": null},
        ]);
        let mut payload = DetailsPayload::new("eiga.com");
        payload.full_cast = Some(cast.clone());

        let mut record = CatalogRecord::new("001", "A Film");
        let mut sink = VecSink::default();
        merge_payload(&mut record, &payload, &MergePolicy::default(), &mut sink);

        let stored = record.get("full_cast").expect("full_cast written");
        let back: serde_json::Value = serde_json::from_str(stored).unwrap();
        assert_eq!(back, cast);
    }

    #[test]
    fn sentinel_year_written_when_enabled() {
        let mut record = CatalogRecord::new("001", "A Film");
        let empty = DetailsPayload::new("eiga.com");
        let policy = MergePolicy { sentinel_year: true };

        let mut sink = VecSink::default();
        let outcome = merge_payload(&mut record, &empty, &policy, &mut sink);

        assert!(outcome.changed);
        assert_eq!(record.year(), Some(SENTINEL_YEAR));
        assert!(sink.0.iter().any(|e| matches!(e, Event::SentinelYearWritten { .. })));
    }

    #[test]
    fn sentinel_year_skipped_when_disabled_or_found() {
        let mut record = CatalogRecord::new("001", "A Film");
        let empty = DetailsPayload::new("eiga.com");
        let mut sink = VecSink::default();

        let outcome = merge_payload(&mut record, &empty, &MergePolicy::default(), &mut sink);
        assert!(!outcome.changed);
        assert!(record.is_absent("year"));

        // A real year beats the sentinel even with the policy on
        let policy = MergePolicy { sentinel_year: true };
        let outcome = merge_payload(&mut record, &payload_2004(), &policy, &mut sink);
        assert!(outcome.changed);
        assert_eq!(record.year(), Some(2004));
    }

    #[test]
    fn change_display_is_truncated() {
        let mut record = CatalogRecord::new("001", "A Film");
        let mut payload = DetailsPayload::new("eiga.com");
        payload.summary = Some("x".repeat(80));

        let mut sink = VecSink::default();
        let outcome = merge_payload(&mut record, &payload, &MergePolicy::default(), &mut sink);

        let change = &outcome.changes[0];
        assert_eq!(change.display.chars().count(), 30);
        assert!(change.display.ends_with("..."));
        // stored value keeps its full length
        assert_eq!(record.get("summary").unwrap().len(), 80);
    }
}

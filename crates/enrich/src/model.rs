use std::collections::HashMap;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Placeholder year written when a live fetch attempt found nothing.
/// Marks the record as "searched, not found" so it is not re-selected
/// as a candidate on later runs. Deliberately not a real year.
pub const SENTINEL_YEAR: i64 = 1800;

/// Maximum stored summary length in characters; longer text is cut and
/// suffixed with `...`.
pub const SUMMARY_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Stored as a canonical integer (`year`, `runtime`).
    Integer,
    /// Stored as plain text.
    Text,
    /// Native list/mapping, stored as a serialized JSON blob.
    Structured,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// The enrichable fields, in merge and export order. This list is the
/// schema: the merger walks it explicitly and never discovers fields
/// dynamically.
pub const ENRICHABLE_FIELDS: [FieldSpec; 12] = [
    FieldSpec { name: "year", kind: FieldKind::Integer },
    FieldSpec { name: "director", kind: FieldKind::Text },
    FieldSpec { name: "summary", kind: FieldKind::Text },
    FieldSpec { name: "cast", kind: FieldKind::Text },
    FieldSpec { name: "producer", kind: FieldKind::Text },
    FieldSpec { name: "cinematographer", kind: FieldKind::Text },
    FieldSpec { name: "country", kind: FieldKind::Text },
    FieldSpec { name: "runtime", kind: FieldKind::Integer },
    FieldSpec { name: "distributor", kind: FieldKind::Text },
    FieldSpec { name: "full_staff", kind: FieldKind::Structured },
    FieldSpec { name: "full_cast", kind: FieldKind::Structured },
    FieldSpec { name: "reviews", kind: FieldKind::Structured },
];

/// Identifier columns; never merged into.
pub const KEY_COLUMNS: [&str; 2] = ["movie_id", "title"];

// ---------------------------------------------------------------------------
// Catalog record
// ---------------------------------------------------------------------------

/// One row of the movie catalog.
///
/// A field is either present (a non-empty stored value) or absent — there
/// is exactly one absence representation: no entry in the value map.
/// Empty CSV cells load as absent; present values are never overwritten.
#[derive(Debug, Clone)]
pub struct CatalogRecord {
    /// Stable unique identifier. Opaque text — leading zeros survive.
    pub movie_id: String,
    pub title: String,
    values: HashMap<String, String>,
}

impl CatalogRecord {
    pub fn new(movie_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            movie_id: movie_id.into(),
            title: title.into(),
            values: HashMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn is_absent(&self, field: &str) -> bool {
        !self.values.contains_key(field)
    }

    /// Store a value. Empty (or whitespace-only) input is treated as
    /// absent and leaves the record unchanged.
    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.values.insert(field.to_string(), value);
    }

    /// `year` as an integer, if present and numeric.
    pub fn year(&self) -> Option<i64> {
        self.get("year").and_then(|v| v.trim().parse().ok())
    }

    /// `runtime` in minutes, if present and numeric.
    pub fn runtime(&self) -> Option<i64> {
        self.get("runtime").and_then(|v| v.trim().parse().ok())
    }
}

// ---------------------------------------------------------------------------
// Details payload
// ---------------------------------------------------------------------------

/// A payload field value, tagged with its storage class.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    /// Numeric field: raw JSON value (integer, float, or numeric string).
    Number(&'a Value),
    Text(&'a str),
    /// Structured field: native list/mapping, not yet serialized.
    Structured(&'a Value),
}

/// Standardized extraction result from one external source for one title.
///
/// Numeric and structured slots keep the loosely-typed value the source
/// (or a replay file) delivered; [`crate::coerce`] normalizes them at
/// merge time. Absence is uniformly `None` — JSON `null` and empty
/// strings deserialize to `None`, never to a sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailsPayload {
    #[serde(default)]
    pub source: String,

    #[serde(default, deserialize_with = "de_value", skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub cast: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub cinematographer: Option<String>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "de_value", skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Value>,
    #[serde(default, deserialize_with = "de_text", skip_serializing_if = "Option::is_none")]
    pub distributor: Option<String>,
    #[serde(default, deserialize_with = "de_value", skip_serializing_if = "Option::is_none")]
    pub full_staff: Option<Value>,
    #[serde(default, deserialize_with = "de_value", skip_serializing_if = "Option::is_none")]
    pub full_cast: Option<Value>,
    /// Either an ordered list of review objects or an
    /// `{average_score, review_count}` summary — source-dependent.
    #[serde(default, deserialize_with = "de_value", skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Value>,
}

impl DetailsPayload {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// The value for a schema field, tagged with its kind. `None` when
    /// the source could not extract it.
    pub fn field(&self, spec: &FieldSpec) -> Option<FieldValue<'_>> {
        fn num(v: &Option<Value>) -> Option<FieldValue<'_>> {
            v.as_ref().filter(|v| !v.is_null()).map(FieldValue::Number)
        }
        fn text(v: &Option<String>) -> Option<FieldValue<'_>> {
            v.as_deref().filter(|s| !s.trim().is_empty()).map(FieldValue::Text)
        }
        fn structured(v: &Option<Value>) -> Option<FieldValue<'_>> {
            v.as_ref().filter(|v| !v.is_null()).map(FieldValue::Structured)
        }

        match spec.name {
            "year" => num(&self.year),
            "director" => text(&self.director),
            "summary" => text(&self.summary),
            "cast" => text(&self.cast),
            "producer" => text(&self.producer),
            "cinematographer" => text(&self.cinematographer),
            "country" => text(&self.country),
            "runtime" => num(&self.runtime),
            "distributor" => text(&self.distributor),
            "full_staff" => structured(&self.full_staff),
            "full_cast" => structured(&self.full_cast),
            "reviews" => structured(&self.reviews),
            _ => None,
        }
    }

    /// True when every enrichable slot is absent.
    pub fn is_empty(&self) -> bool {
        ENRICHABLE_FIELDS.iter().all(|spec| self.field(spec).is_none())
    }
}

/// Lenient text slot: JSON `null` and empty strings become `None`;
/// non-text scalars are coerced to their display form.
fn de_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| {
        if v.is_null() {
            return None;
        }
        let text = coerce::to_text(v);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }))
}

/// Raw value slot: JSON `null` becomes `None`.
fn de_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_null()))
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

/// One element of the audit JSON file: a payload plus the record it was
/// fetched for. The same shape is consumed back in replay mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(default, deserialize_with = "de_id")]
    pub movie_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub payload: DetailsPayload,
}

/// `movie_id` in replay files may arrive as a JSON number; coerce to the
/// opaque text form the catalog uses.
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

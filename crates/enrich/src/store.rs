//! In-memory catalog table, keyed by `movie_id`.
//!
//! The catalog file is CSV in the legacy Shift_JIS encoding. Loading
//! decodes to UTF-8; saving encodes back, substituting `?` for anything
//! Shift_JIS cannot represent — an explicit lossy but recoverable policy
//! (the audit JSON keeps the full Unicode form).

use std::collections::HashMap;
use std::path::Path;

use crate::error::EnrichError;
use crate::model::{CatalogRecord, ENRICHABLE_FIELDS, KEY_COLUMNS};

#[derive(Debug)]
pub struct CatalogStore {
    /// Column names as loaded, plus any schema columns appended by
    /// [`CatalogStore::ensure_columns`].
    columns: Vec<String>,
    records: Vec<CatalogRecord>,
    index: HashMap<String, usize>,
}

impl CatalogStore {
    /// Load the catalog from a Shift_JIS CSV file. The `movie_id` column
    /// is opaque text — never parsed as a number, so leading zeros and
    /// non-numeric identifiers survive.
    pub fn load(path: &Path) -> Result<Self, EnrichError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EnrichError::NotFound(path.display().to_string()),
            _ => EnrichError::Io(e.to_string()),
        })?;
        let (text, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes);
        Self::from_csv(&text)
    }

    /// Parse catalog rows from decoded CSV text.
    pub fn from_csv(text: &str) -> Result<Self, EnrichError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| EnrichError::MalformedInput(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        for key in KEY_COLUMNS {
            if !columns.iter().any(|c| c == key) {
                return Err(EnrichError::MalformedInput(format!(
                    "missing required column '{key}'"
                )));
            }
        }
        let id_idx = columns.iter().position(|c| c == "movie_id").unwrap();
        let title_idx = columns.iter().position(|c| c == "title").unwrap();

        let mut records = Vec::new();
        let mut index = HashMap::new();

        for row in reader.records() {
            let row = row.map_err(|e| EnrichError::MalformedInput(e.to_string()))?;
            let movie_id = row.get(id_idx).unwrap_or("").trim().to_string();
            let title = row.get(title_idx).unwrap_or("").trim().to_string();
            if movie_id.is_empty() {
                return Err(EnrichError::MalformedInput(format!(
                    "row {} has an empty movie_id",
                    records.len() + 1
                )));
            }

            let mut record = CatalogRecord::new(movie_id.clone(), title);
            for (i, column) in columns.iter().enumerate() {
                if i == id_idx || i == title_idx {
                    continue;
                }
                if let Some(value) = row.get(i) {
                    // empty cells load as absent
                    record.set(column, value.trim());
                }
            }

            index.insert(movie_id, records.len());
            records.push(record);
        }

        Ok(Self { columns, records, index })
    }

    /// Guarantee every schema column exists in the table layout. Existing
    /// values are untouched; new columns are absent for every record.
    pub fn ensure_columns(&mut self) {
        for spec in &ENRICHABLE_FIELDS {
            if !self.columns.iter().any(|c| c == spec.name) {
                self.columns.push(spec.name.to_string());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn lookup(&self, movie_id: &str) -> Option<&CatalogRecord> {
        self.index.get(movie_id).map(|&i| &self.records[i])
    }

    pub fn lookup_mut(&mut self, movie_id: &str) -> Option<&mut CatalogRecord> {
        self.index.get(movie_id).map(|&i| &mut self.records[i])
    }

    pub fn records(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.iter()
    }

    /// Identifiers of records matching `predicate`, ordered by `movie_id`
    /// (lexicographic — deterministic across runs), capped at `limit`.
    pub fn select_candidates<F>(&self, predicate: F, limit: usize) -> Vec<String>
    where
        F: Fn(&CatalogRecord) -> bool,
    {
        let mut ids: Vec<String> = self
            .records
            .iter()
            .filter(|r| predicate(r))
            .map(|r| r.movie_id.clone())
            .collect();
        ids.sort();
        ids.truncate(limit);
        ids
    }

    /// Output column order: schema columns first in schema order, then
    /// any extra columns in their original order.
    pub fn export_header(&self) -> Vec<String> {
        let mut header: Vec<String> =
            KEY_COLUMNS.iter().map(|c| c.to_string()).collect();
        for spec in &ENRICHABLE_FIELDS {
            if self.columns.iter().any(|c| c == spec.name) {
                header.push(spec.name.to_string());
            }
        }
        for column in &self.columns {
            if !header.iter().any(|c| c == column) {
                header.push(column.clone());
            }
        }
        header
    }

    /// Serialize the full table back to Shift_JIS CSV. Unrepresentable
    /// characters become `?` instead of failing the save.
    pub fn save(&self, path: &Path) -> Result<(), EnrichError> {
        let header = self.export_header();
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&header)
            .map_err(|e| EnrichError::Io(e.to_string()))?;

        for record in &self.records {
            let row: Vec<&str> = header
                .iter()
                .map(|column| match column.as_str() {
                    "movie_id" => record.movie_id.as_str(),
                    "title" => record.title.as_str(),
                    other => record.get(other).unwrap_or(""),
                })
                .collect();
            writer
                .write_record(&row)
                .map_err(|e| EnrichError::Io(e.to_string()))?;
        }

        let buffer = writer
            .into_inner()
            .map_err(|e| EnrichError::Io(e.to_string()))?;
        let text = String::from_utf8(buffer).map_err(|e| EnrichError::Io(e.to_string()))?;

        std::fs::write(path, encode_shift_jis_lossy(&text))
            .map_err(|e| EnrichError::Io(e.to_string()))
    }
}

/// Encode to Shift_JIS, replacing unmappable characters with `?`.
fn encode_shift_jis_lossy(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let (bytes, _, unmappable) = encoding_rs::SHIFT_JIS.encode(ch.encode_utf8(&mut buf));
        if unmappable {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

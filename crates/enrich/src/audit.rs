//! Audit file persistence.
//!
//! Every non-empty payload fetched in a pass is written to a UTF-8 JSON
//! array before the catalog itself is saved. The file is the recovery
//! point: an interrupted catalog save loses nothing, because a replay
//! run over the audit file reconstructs the same merge.

use std::path::Path;

use crate::driver::parse_replay;
use crate::error::EnrichError;
use crate::model::AuditEntry;

/// Write the audit trail as human-readable JSON, full Unicode preserved.
pub fn save_audit(entries: &[AuditEntry], path: &Path) -> Result<(), EnrichError> {
    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| EnrichError::Io(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| EnrichError::Io(e.to_string()))
}

/// Read a replay input (same shape as the audit file) and validate it.
pub fn load_audit(path: &Path) -> Result<Vec<AuditEntry>, EnrichError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => EnrichError::NotFound(path.display().to_string()),
        _ => EnrichError::Io(e.to_string()),
    })?;
    parse_replay(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DetailsPayload;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn audit_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.json");

        let mut payload = DetailsPayload::new("eiga.com");
        payload.year = Some(json!(2004));
        payload.summary = Some("あらすじ".into());
        let entries = vec![AuditEntry {
            movie_id: "001".into(),
            title: "七人の侍".into(),
            payload,
        }];

        save_audit(&entries, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("あらすじ"), "audit JSON must not ASCII-escape");

        let loaded = load_audit(&path).unwrap();
        assert_eq!(loaded, entries);
    }

    #[test]
    fn load_missing_audit_is_not_found() {
        let err = load_audit(Path::new("/no/such/audit.json")).unwrap_err();
        assert!(matches!(err, EnrichError::NotFound(_)));
    }
}

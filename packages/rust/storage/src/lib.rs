//! JSON catalog store.
//!
//! The [`CatalogStore`] owns the single JSON file holding every VTC record.
//! Two on-disk shapes exist and are normalized on load:
//! - list format, a JSON array of records (written by `enrich` and `tag`)
//! - skeleton format, `{"count": N, "vtcs": [...]}` (written by `crawl`)
//!
//! **Failure rules:**
//! - reading is soft: a missing or malformed file is an empty catalog
//! - writing is hard: any I/O or serialization failure is returned to the caller

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use vtcfinder_shared::{Game, Recruitment, Result, VtcFinderError, VtcId, VtcRecord, VtcStatus};

/// Which on-disk shape a catalog file used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    /// A JSON array of records.
    List,
    /// `{"count": N, "vtcs": [...]}` as written by the directory crawl.
    Skeleton,
}

/// Handle on the catalog file.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every record, sorted by id with duplicates collapsed (last wins).
    ///
    /// Never fails: a missing file, unreadable file or unexpected JSON shape
    /// yields an empty catalog and a warning.
    pub fn load(&self) -> Vec<VtcRecord> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "catalog does not exist, starting empty");
            return Vec::new();
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not read catalog, starting empty");
                return Vec::new();
            }
        };

        match parse_catalog(&content) {
            Ok((records, format)) => {
                info!(
                    path = %self.path.display(),
                    count = records.len(),
                    ?format,
                    "loaded catalog"
                );
                records
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed catalog");
                Vec::new()
            }
        }
    }

    /// Write `records` in list format, sorted ascending by id, one record per id.
    ///
    /// Returns the number of records written.
    pub fn save(&self, records: &[VtcRecord]) -> Result<usize> {
        let records = normalize(records.iter().cloned());
        self.write_json(&records)?;
        info!(path = %self.path.display(), count = records.len(), "saved catalog");
        Ok(records.len())
    }

    /// Write a skeleton catalog (id only, other fields null) for `ids`.
    pub fn save_skeleton(&self, ids: &[VtcId]) -> Result<usize> {
        let vtcs: Vec<SkeletonEntry> = ids.iter().map(|&id| SkeletonEntry::new(id)).collect();
        let catalog = SkeletonCatalog {
            count: vtcs.len(),
            vtcs,
        };
        self.write_json(&catalog)?;
        info!(path = %self.path.display(), count = catalog.count, "saved skeleton catalog");
        Ok(catalog.count)
    }

    fn write_json<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| VtcFinderError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(value)
            .map_err(|e| VtcFinderError::Storage(format!("failed to serialize catalog: {e}")))?;

        std::fs::write(&self.path, json).map_err(|e| VtcFinderError::io(&self.path, e))
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse either catalog shape. Only entries without a usable `id` are
/// skipped (with a warning); mistyped optional fields load as unset.
pub fn parse_catalog(content: &str) -> Result<(Vec<VtcRecord>, CatalogFormat)> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| VtcFinderError::Storage(format!("catalog is not valid JSON: {e}")))?;

    let (entries, format) = match value {
        Value::Array(entries) => (entries, CatalogFormat::List),
        Value::Object(mut obj) => match obj.remove("vtcs") {
            Some(Value::Array(entries)) => (entries, CatalogFormat::Skeleton),
            _ => {
                return Err(VtcFinderError::Storage(
                    "catalog object has no \"vtcs\" array".into(),
                ));
            }
        },
        _ => {
            return Err(VtcFinderError::Storage(
                "catalog must be a JSON array or an object with \"vtcs\"".into(),
            ));
        }
    };

    let records = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<VtcRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(index, error = %e, "skipping unreadable catalog entry");
                None
            }
        });

    Ok((normalize(records), format))
}

/// Collapse duplicate ids (later entries win) and sort ascending by id.
fn normalize(records: impl IntoIterator<Item = VtcRecord>) -> Vec<VtcRecord> {
    let mut by_id: BTreeMap<VtcId, VtcRecord> = BTreeMap::new();
    for record in records {
        if by_id.insert(record.id, record).is_some() {
            debug!("duplicate catalog id collapsed");
        }
    }
    by_id.into_values().collect()
}

// ---------------------------------------------------------------------------
// Skeleton format
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SkeletonCatalog {
    count: usize,
    vtcs: Vec<SkeletonEntry>,
}

#[derive(Serialize)]
struct SkeletonEntry {
    id: VtcId,
    name: Option<String>,
    status: Option<VtcStatus>,
    games: Vec<Game>,
    recruitment: Option<Recruitment>,
}

impl SkeletonEntry {
    fn new(id: VtcId) -> Self {
        Self {
            id,
            name: None,
            status: None,
            games: Vec::new(),
            recruitment: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// A catalog path inside a fresh temp directory.
    fn test_store() -> CatalogStore {
        let dir = std::env::temp_dir().join(format!("vtcfinder_test_{}", Uuid::now_v7()));
        CatalogStore::new(dir.join("vtcs_source.json"))
    }

    fn named(id: VtcId, name: &str) -> VtcRecord {
        VtcRecord {
            name: Some(name.into()),
            status: Some(VtcStatus::Normal),
            ..VtcRecord::skeleton(id)
        }
    }

    #[test]
    fn missing_file_is_empty_catalog() {
        let store = test_store();
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_sorts_and_dedups() {
        let store = test_store();
        let records = vec![named(30, "C"), named(10, "A"), named(30, "C2"), named(20, "B")];

        let written = store.save(&records).expect("save");
        assert_eq!(written, 3);

        let loaded = store.load();
        let ids: Vec<VtcId> = loaded.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(loaded[2].name.as_deref(), Some("C2"));

        let raw = std::fs::read_to_string(store.path()).expect("read back");
        assert!(raw.trim_start().starts_with('['));
    }

    #[test]
    fn skeleton_format_roundtrips_through_loader() {
        let store = test_store();
        store.save_skeleton(&[7265, 42]).expect("save skeleton");

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["count"], 2);
        assert_eq!(raw["vtcs"][0]["id"], 7265);
        assert!(raw["vtcs"][0]["name"].is_null());
        assert_eq!(raw["vtcs"][0]["games"], serde_json::json!([]));

        let loaded = store.load();
        assert_eq!(loaded, vec![VtcRecord::skeleton(42), VtcRecord::skeleton(7265)]);
    }

    #[test]
    fn malformed_catalog_is_treated_as_empty() {
        let store = test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();

        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());

        std::fs::write(store.path(), r#"{"count": 3}"#).unwrap();
        assert!(store.load().is_empty());

        std::fs::write(store.path(), "42").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let content = r#"[
            {"id": 1, "name": "One"},
            {"id": "not-a-number"},
            {"name": "no id"},
            {"id": "3", "name": "Three"}
        ]"#;
        let (records, format) = parse_catalog(content).expect("parse");
        assert_eq!(format, CatalogFormat::List);
        let ids: Vec<VtcId> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn mistyped_fields_do_not_drop_records() {
        let store = test_store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"[
                {"id": 1, "name": "Polska Trans"},
                {"id": 2, "name": "Acme", "members": "12"},
                {"id": 3, "name": "Beta", "discord_invites": null},
                {"id": 4, "name": "Gamma", "members": -1, "games": "ETS2"}
            ]"#,
        )
        .unwrap();

        let loaded = store.load();
        let ids: Vec<VtcId> = loaded.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(loaded[1].members, Some(12));

        store.save(&loaded).expect("save");
        let reloaded = store.load();
        assert_eq!(reloaded, loaded);
        assert_eq!(reloaded[3].name.as_deref(), Some("Gamma"));
    }

    #[test]
    fn non_ascii_names_are_written_verbatim() {
        let store = test_store();
        store.save(&[named(5, "Türk Lojistik")]).expect("save");
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("Türk Lojistik"));
    }

    #[test]
    fn write_failure_is_an_error() {
        let dir = std::env::temp_dir().join(format!("vtcfinder_test_{}", Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        // The catalog path is an existing directory, so the write must fail.
        let store = CatalogStore::new(&dir);
        let err = store.save(&[named(1, "A")]).unwrap_err();
        assert!(matches!(err, VtcFinderError::Io { .. }));
    }
}

// Backup and restore
// A snapshot is the whole catalog as one JSON object. Restore replaces all three collections in
// a single atomic batch, after validating the snapshot and before touching storage.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::catalog::models::to_document;
use crate::catalog::{Catalog, Disk, FileRecord, Programme};
use crate::constants::BACKUP_FILE_PREFIX;
use crate::error::{CatalogError, Result};
use crate::store::{BatchOp, Collection, DocumentStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub files: Vec<FileRecord>,
    pub programmes: Vec<Programme>,
    pub disks: Vec<Disk>,
}

/// Wire shape: missing or null collections restore as empty.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSnapshot {
    #[serde(default)]
    files: Option<Vec<FileRecord>>,
    #[serde(default)]
    programmes: Option<Vec<Programme>>,
    #[serde(default)]
    disks: Option<Vec<Disk>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub files: usize,
    pub programmes: usize,
    pub disks: usize,
    pub removed: usize,
}

impl Snapshot {
    /// Parse and validate snapshot text. Anything but the expected object shape is rejected.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CatalogError::Validation(format!("snapshot is not valid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(CatalogError::Validation("snapshot must be a JSON object".to_string()));
        }

        let raw: RawSnapshot = serde_json::from_value(value)
            .map_err(|e| CatalogError::Validation(format!("malformed snapshot: {}", e)))?;
        let snapshot = Snapshot {
            files: raw.files.unwrap_or_default(),
            programmes: raw.programmes.unwrap_or_default(),
            disks: raw.disks.unwrap_or_default(),
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every record needs a usable storage key.
    pub fn validate(&self) -> Result<()> {
        if let Some(pos) = self.files.iter().position(|f| f.record_id().is_empty()) {
            return Err(CatalogError::Validation(format!(
                "file #{} has no usable filePath",
                pos + 1
            )));
        }
        if let Some(pos) = self.programmes.iter().position(|p| p.id.trim().is_empty()) {
            return Err(CatalogError::Validation(format!("programme #{} has no id", pos + 1)));
        }
        if let Some(pos) = self.disks.iter().position(|d| d.id.trim().is_empty()) {
            return Err(CatalogError::Validation(format!("disk #{} has no id", pos + 1)));
        }
        Ok(())
    }
}

/// Read all three collections in full.
pub fn backup<S: DocumentStore>(catalog: &Catalog<S>) -> Result<Snapshot> {
    let snapshot = Snapshot {
        files: catalog.list_files()?,
        programmes: catalog.list_programmes()?,
        disks: catalog.list_disks()?,
    };
    log::info!(
        "Backed up {} files, {} programmes, {} disks",
        snapshot.files.len(),
        snapshot.programmes.len(),
        snapshot.disks.len()
    );
    Ok(snapshot)
}

/// Replace the catalog's contents with the snapshot. Either every collection is replaced or
/// none is.
pub fn restore<S: DocumentStore>(catalog: &mut Catalog<S>, snapshot: &Snapshot) -> Result<RestoreReport> {
    snapshot.validate()?;

    let store = catalog.store_mut();
    let mut ops = Vec::new();
    let mut report = RestoreReport {
        files: snapshot.files.len(),
        programmes: snapshot.programmes.len(),
        disks: snapshot.disks.len(),
        removed: 0,
    };

    for collection in Collection::ALL {
        for entry in store.get(collection)? {
            ops.push(BatchOp::delete(collection, entry.id));
            report.removed += 1;
        }
        match collection {
            Collection::Files => {
                for file in &snapshot.files {
                    ops.push(BatchOp::put(collection, file.record_id(), to_document(file)?));
                }
            }
            Collection::Programmes => {
                for programme in &snapshot.programmes {
                    ops.push(BatchOp::put(collection, programme.id.clone(), to_document(programme)?));
                }
            }
            Collection::Disks => {
                for disk in &snapshot.disks {
                    ops.push(BatchOp::put(collection, disk.id.clone(), to_document(disk)?));
                }
            }
        }
    }

    store.atomic_batch(ops).map_err(|e| {
        log::error!("Restore commit failed: {}", e);
        CatalogError::RestoreFailed(Box::new(e))
    })?;

    log::info!(
        "Restored {} files, {} programmes, {} disks (replaced {} documents)",
        report.files,
        report.programmes,
        report.disks,
        report.removed
    );
    Ok(report)
}

/// Parse snapshot text and restore it.
pub fn restore_json<S: DocumentStore>(catalog: &mut Catalog<S>, text: &str) -> Result<RestoreReport> {
    let snapshot = Snapshot::from_json(text)?;
    restore(catalog, &snapshot)
}

pub fn write_snapshot_file(path: &Path, snapshot: &Snapshot) -> Result<()> {
    std::fs::write(path, snapshot.to_json_pretty()?)?;
    Ok(())
}

pub fn read_snapshot_file(path: &Path) -> Result<Snapshot> {
    let text = std::fs::read_to_string(path)?;
    Snapshot::from_json(&text)
}

/// `catalog_backup_<YYYYmmdd_HHMMSS>.json`
pub fn default_backup_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}.json", BACKUP_FILE_PREFIX, at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn populated() -> Catalog<MemoryStore> {
        let mut catalog = Catalog::new(MemoryStore::new());
        catalog.add_disk("D1").unwrap();
        catalog.add_programme("News").unwrap();
        catalog.upsert_file(&FileRecord::scanned("news/ep1.mp4", "D1")).unwrap();
        catalog.upsert_file(&FileRecord::scanned("news/ep2.mp4", "D1")).unwrap();
        let mut meta = crate::catalog::Metadata::new();
        meta.insert("Name of Programme".into(), "News".into());
        catalog.set_file_metadata("news/ep2.mp4", meta).unwrap();
        catalog
    }

    #[test]
    fn test_backup_then_restore_is_identity() {
        let mut catalog = populated();
        let before = backup(&catalog).unwrap();

        let report = restore(&mut catalog, &before).unwrap();
        assert_eq!(report.files, 2);
        assert_eq!(report.removed, 4);

        let after = backup(&catalog).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_restore_replaces_everything() {
        let mut catalog = populated();
        let snapshot = Snapshot {
            files: vec![FileRecord::scanned("sport/final.mp4", "D9")],
            programmes: vec![],
            disks: vec![Disk { id: "D9".into() }],
        };
        restore(&mut catalog, &snapshot).unwrap();

        assert_eq!(catalog.list_files().unwrap(), snapshot.files);
        assert!(catalog.list_programmes().unwrap().is_empty());
        assert_eq!(catalog.list_disks().unwrap(), snapshot.disks);
    }

    #[test]
    fn test_missing_collections_clear() {
        let mut catalog = populated();
        restore_json(&mut catalog, r#"{"files": [], "programmes": null}"#).unwrap();
        assert!(catalog.list_files().unwrap().is_empty());
        assert!(catalog.list_programmes().unwrap().is_empty());
        assert!(catalog.list_disks().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_snapshot_leaves_catalog() {
        let mut catalog = populated();
        let before = backup(&catalog).unwrap();

        for bad in [
            r#"{"files": {"a": 1}, "programmes": [], "disks": []}"#,
            r#"[[], [], []]"#,
            r#"{"files": [], "version": 2}"#,
            r#"{"files": [{"diskId": "D1"}]}"#,
            r#"{"files": [{"filePath": "%%%"}]}"#,
            r#"{"disks": [{"id": " "}]}"#,
            "not json",
        ] {
            let err = restore_json(&mut catalog, bad).unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)), "{} gave {:?}", bad, err);
        }

        assert_eq!(backup(&catalog).unwrap(), before);
    }

    /// Memory store whose batch commits always fail.
    #[derive(Default)]
    struct RejectingBatchStore {
        inner: MemoryStore,
    }

    impl DocumentStore for RejectingBatchStore {
        fn get(&self, collection: Collection) -> Result<Vec<crate::store::DocumentEntry>> {
            self.inner.get(collection)
        }

        fn get_one(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
            self.inner.get_one(collection, id)
        }

        fn put(&mut self, collection: Collection, id: &str, document: Value) -> Result<()> {
            self.inner.put(collection, id, document)
        }

        fn delete(&mut self, collection: Collection, id: &str) -> Result<()> {
            self.inner.delete(collection, id)
        }

        fn atomic_batch(&mut self, _ops: Vec<BatchOp>) -> Result<()> {
            Err(CatalogError::TransientIo("commit rejected".to_string()))
        }
    }

    #[test]
    fn test_commit_failure_is_fatal_and_leaves_catalog() {
        let mut catalog = Catalog::new(RejectingBatchStore::default());
        catalog.add_disk("D1").unwrap();
        catalog.upsert_file(&FileRecord::scanned("a.mp4", "D1")).unwrap();
        let before = backup(&catalog).unwrap();

        let err = restore(&mut catalog, &Snapshot::default()).unwrap_err();
        assert!(matches!(err, CatalogError::RestoreFailed(_)));
        assert!(err.is_transient());
        assert_eq!(backup(&catalog).unwrap(), before);
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");
        let snapshot = backup(&populated()).unwrap();

        write_snapshot_file(&path, &snapshot).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"files\": ["), "snapshot should be pretty-printed");
        assert!(text.contains("\"filePath\": \"news/ep1.mp4\""));

        assert_eq!(read_snapshot_file(&path).unwrap(), snapshot);
    }

    #[test]
    fn test_accepts_numeric_metadata_from_old_backups() {
        let text = r#"{
          "files": [{"filePath": "a.mp4", "diskId": "D1", "metadata": {"Episode Number": 7}}],
          "programmes": [{"id": "News", "name": "News"}],
          "disks": [{"id": "D1"}]
        }"#;
        let snapshot = Snapshot::from_json(text).unwrap();
        assert_eq!(snapshot.files[0].metadata.get("Episode Number").unwrap(), "7");
    }

    #[test]
    fn test_default_backup_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 9, 3, 4).unwrap();
        assert_eq!(default_backup_file_name(&at), "catalog_backup_20240517_090304.json");
    }
}

// Scan reconciliation scenarios

use super::*;
use crate::catalog::Metadata;
use crate::source::discover_local_files;
use crate::store::{BatchOp, Collection, DocumentEntry, MemoryStore, SqliteStore};
use serde_json::Value;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

/// Memory store that starts failing writes after a fixed number of puts.
struct FailingStore {
    inner: MemoryStore,
    puts_left: usize,
}

impl FailingStore {
    fn new(puts_allowed: usize) -> Self {
        Self { inner: MemoryStore::new(), puts_left: puts_allowed }
    }
}

impl DocumentStore for FailingStore {
    fn get(&self, collection: Collection) -> Result<Vec<DocumentEntry>> {
        self.inner.get(collection)
    }

    fn get_one(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        self.inner.get_one(collection, id)
    }

    fn put(&mut self, collection: Collection, id: &str, document: Value) -> Result<()> {
        if self.puts_left == 0 {
            return Err(CatalogError::TransientIo("injected write failure".to_string()));
        }
        self.puts_left -= 1;
        self.inner.put(collection, id, document)
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Result<()> {
        self.inner.delete(collection, id)
    }

    fn atomic_batch(&mut self, ops: Vec<BatchOp>) -> Result<()> {
        self.inner.atomic_batch(ops)
    }
}

fn selection(paths: &[&str]) -> Vec<LocalFile> {
    paths
        .iter()
        .map(|rel| {
            let name = rel.rsplit('/').next().unwrap_or(rel);
            LocalFile::new(name, Some(rel.to_string()), Path::new("/nonexistent").join(name))
        })
        .collect()
}

fn scan<S: DocumentStore>(catalog: &mut Catalog<S>, disk: &str, paths: &[&str]) -> ScanReport {
    reconcile(catalog, disk, &selection(paths), &mut |_| {}).unwrap()
}

fn create_source_files(dir: &Path, files: &[&str]) {
    for rel in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"broadcast master").unwrap();
    }
}

#[test]
fn test_first_scan_inserts_normalized_records() {
    let mut catalog = Catalog::new(MemoryStore::new());
    let report = scan(&mut catalog, "D1", &["Disk07/News/EP1.mp4", "Disk07/News/EP2.mp4"]);

    assert_eq!(report.inserted, 2);
    assert_eq!(report.already_cataloged, 0);

    let files = catalog.list_files().unwrap();
    assert_eq!(files[0], FileRecord::scanned("disk07/news/ep1.mp4", "D1"));
    assert_eq!(files[1].canonical_path, "disk07/news/ep2.mp4");
}

#[test]
fn test_rescan_keeps_metadata() {
    let mut catalog = Catalog::new(MemoryStore::new());
    scan(&mut catalog, "D1", &["Disk07/News/ep1.mp4"]);

    let mut meta = Metadata::new();
    meta.insert("Name of Programme".into(), "News".into());
    meta.insert("Episode Number".into(), "1".into());
    catalog.set_file_metadata("Disk07/News/ep1.mp4", meta.clone()).unwrap();

    let report = scan(&mut catalog, "D1", &["Disk07/News/ep1.mp4", "Disk07/News/ep2.mp4"]);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.already_cataloged, 1);

    let record = catalog.find_file("disk07/news/ep1.mp4").unwrap().unwrap();
    assert_eq!(record.metadata, meta);
}

#[test]
fn test_first_disk_wins() {
    let mut catalog = Catalog::new(MemoryStore::new());
    scan(&mut catalog, "D1", &["Archive/show.mp4"]);
    let report = scan(&mut catalog, "D2", &["archive/SHOW.mp4"]);

    assert_eq!(report.inserted, 0);
    let files = catalog.list_files().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].disk_id, "D1");
}

#[test]
fn test_equivalent_spellings_collapse() {
    let mut catalog = Catalog::new(MemoryStore::new());
    let report = scan(
        &mut catalog,
        "D1",
        &["Disk07/News/ep1.mp4", "disk07\\news\\EP1.MP4", "C:/Disk07/News/ep1.mp4/"],
    );

    assert_eq!(report.inserted, 1);
    assert_eq!(report.already_cataloged, 2);
    assert_eq!(catalog.list_files().unwrap().len(), 1);
}

#[test]
fn test_noise_is_never_cataloged() {
    let mut catalog = Catalog::new(MemoryStore::new());
    let report = scan(
        &mut catalog,
        "D1",
        &[
            "Disk07/.DS_Store",
            "Disk07/Thumbs.db",
            "Disk07/desktop.ini",
            "Disk07/.Trashes/ep9.mp4",
            "Disk07/render.tmp",
            "Disk07/News/ep1.mp4",
        ],
    );

    assert_eq!(report.total_files, 1);
    assert_eq!(report.filtered_out, 5);
    let paths: Vec<String> = catalog.list_files().unwrap().into_iter().map(|f| f.canonical_path).collect();
    assert_eq!(paths, vec!["disk07/news/ep1.mp4"]);
}

#[test]
fn test_progress_is_monotonic_and_completes() {
    let mut catalog = Catalog::new(MemoryStore::new());
    let entries = selection(&["D/a.mp4", "D/.DS_Store", "D/b.mp4", "D/c.mp4"]);
    let mut seen: Vec<ScanProgress> = Vec::new();

    reconcile(&mut catalog, "D1", &entries, &mut |p| seen.push(p.clone())).unwrap();

    let currents: Vec<usize> = seen.iter().map(|p| p.current).collect();
    assert_eq!(currents, vec![1, 2, 3]);
    assert!(seen.iter().all(|p| p.total == 3 && p.disk_id == "D1"));
    assert!(seen.windows(2).all(|w| w[0].percent <= w[1].percent));
    assert!(seen.last().unwrap().is_complete());
}

#[test]
fn test_empty_disk_id_rejected() {
    let mut catalog = Catalog::new(MemoryStore::new());
    let err = reconcile(&mut catalog, "  ", &selection(&["a.mp4"]), &mut |_| {}).unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
    assert!(catalog.list_files().unwrap().is_empty());
}

#[test]
fn test_partial_failure_keeps_earlier_upserts() {
    let mut catalog = Catalog::new(FailingStore::new(2));
    let entries = selection(&["D/a.mp4", "D/b.mp4", "D/c.mp4", "D/d.mp4"]);
    let mut last_progress = 0;

    let err = reconcile(&mut catalog, "D1", &entries, &mut |p| last_progress = p.current).unwrap_err();

    match &err {
        CatalogError::Reconcile { processed, total, source } => {
            assert_eq!(*processed, 2);
            assert_eq!(*total, 4);
            assert!(matches!(**source, CatalogError::TransientIo(_)));
        }
        other => panic!("expected Reconcile, got {:?}", other),
    }
    assert!(err.is_transient());
    assert_eq!(last_progress, 2);

    let paths: Vec<String> = catalog.list_files().unwrap().into_iter().map(|f| f.canonical_path).collect();
    assert_eq!(paths, vec!["d/a.mp4", "d/b.mp4"]);
}

#[test]
fn test_scan_discovered_folder_into_sqlite() {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("Disk07");
    create_source_files(
        &source,
        &["News/EP1.mp4", "News/EP2.mp4", "Sport/final.mov", ".DS_Store", "News/Thumbs.db"],
    );

    let entries = discover_local_files(&source).unwrap();
    assert_eq!(entries.len(), 5);

    let db_path = tmp.path().join("catalog.db");
    let mut catalog = Catalog::new(SqliteStore::open(&db_path).unwrap());
    let report = reconcile(&mut catalog, "D7", &entries, &mut |_| {}).unwrap();
    assert_eq!(report.inserted, 3);
    assert_eq!(report.filtered_out, 2);

    // Reopen and rescan: nothing new, nothing lost
    drop(catalog);
    let mut catalog = Catalog::new(SqliteStore::open(&db_path).unwrap());
    let report = reconcile(&mut catalog, "D7", &entries, &mut |_| {}).unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.already_cataloged, 3);

    let paths: Vec<String> = catalog.list_files().unwrap().into_iter().map(|f| f.canonical_path).collect();
    assert_eq!(paths, vec!["disk07/news/ep1.mp4", "disk07/news/ep2.mp4", "disk07/sport/final.mov"]);
}

#[test]
fn test_upserted_spelling_is_not_duplicated_by_scan() {
    let mut catalog = Catalog::new(MemoryStore::new());
    catalog.upsert_file(&FileRecord::scanned("Tapes/EP1.mp4", "D1")).unwrap();

    let report = scan(&mut catalog, "D1", &["Tapes/EP1.mp4"]);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.already_cataloged, 1);

    let files = catalog.list_files().unwrap();
    assert_eq!(files, vec![FileRecord::scanned("tapes/ep1.mp4", "D1")]);
}

#[test]
fn test_upsert_rejects_empty_path() {
    let mut catalog = Catalog::new(MemoryStore::new());
    let err = catalog.upsert_file(&FileRecord::scanned("///", "D1")).unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
    assert!(catalog.list_files().unwrap().is_empty());
}

#[test]
fn test_colliding_ids_keep_first_path() {
    let mut catalog = Catalog::new(MemoryStore::new());
    let first = scan(&mut catalog, "D1", &["a/b#1.mp4"]);
    assert_eq!(first.inserted, 1);
    let before = catalog.list_files().unwrap();

    // "a/b1.mp4" sanitizes to the same id as "a/b#1.mp4"
    let second = scan(&mut catalog, "D2", &["a/b1.mp4"]);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.already_cataloged, 1);

    assert_eq!(catalog.list_files().unwrap(), before);
    assert_eq!(before[0].canonical_path, "a/b#1.mp4");
    assert!(catalog.find_file("a/b#1.mp4").unwrap().is_some());
    assert!(catalog.find_file("a/b1.mp4").unwrap().is_none());
}

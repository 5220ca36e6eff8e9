// Metadata catalog
// Files, disks and programmes on top of a document store. A file's storage id is always
// `sanitize_id(canonical_path)`; disks and programmes are unique by case-insensitive name.

pub mod models;

use serde_json::json;

use crate::access;
use crate::config::FieldLabels;
use crate::constants::{FIELD_FILE_PATH, FIELD_METADATA, FIELD_NAME};
use crate::error::{CatalogError, Result};
use crate::identity::{display_name, normalize_path, sanitize_id};
use crate::source::LocalFile;
use crate::store::{BatchOp, Collection, DocumentStore, Predicate};

pub use models::{Disk, FileRecord, Metadata, Programme};
use models::{disk_from_entry, from_entry, programme_from_entry, to_document};

#[derive(Debug)]
pub struct Catalog<S: DocumentStore> {
    store: S,
    labels: FieldLabels,
}

impl<S: DocumentStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self::with_labels(store, FieldLabels::default())
    }

    pub fn with_labels(store: S, labels: FieldLabels) -> Self {
        Self { store, labels }
    }

    pub fn labels(&self) -> &FieldLabels {
        &self.labels
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ----- Files -----

    pub fn list_files(&self) -> Result<Vec<FileRecord>> {
        self.store
            .get(Collection::Files)?
            .into_iter()
            .map(|entry| from_entry(Collection::Files, entry))
            .collect()
    }

    /// Look a file up by any spelling of its path. Paths stored verbatim by a restore are
    /// found by their exact text as well.
    pub fn find_file(&self, path: &str) -> Result<Option<FileRecord>> {
        let canonical = normalize_path(path);
        if canonical.is_empty() {
            return Ok(None);
        }

        if let Some(document) = self.store.get_one(Collection::Files, &sanitize_id(&canonical))? {
            let record: FileRecord = serde_json::from_value(document)?;
            if record.canonical_path == canonical {
                return Ok(Some(record));
            }
        }

        // The id slot may belong to a colliding path; fall back to the natural key.
        let mut keys = vec![canonical];
        if path != keys[0] {
            keys.push(path.to_string());
        }
        for key in keys {
            let mut hits = self
                .store
                .query(Collection::Files, &[Predicate::eq(FIELD_FILE_PATH, key)])?;
            if !hits.is_empty() {
                return from_entry(Collection::Files, hits.swap_remove(0)).map(Some);
            }
        }
        Ok(None)
    }

    /// Insert or fully replace the record stored under its derived id. The path is normalized
    /// first, so every spelling of a file lands on the same record.
    pub fn upsert_file(&mut self, record: &FileRecord) -> Result<()> {
        let record = canonical_record(record)?;
        self.store
            .put(Collection::Files, &record.record_id(), to_document(&record)?)
    }

    /// Insert only when no record holds the id yet. Returns whether it was inserted.
    pub fn insert_file_if_absent(&mut self, record: &FileRecord) -> Result<bool> {
        let record = canonical_record(record)?;
        let id = record.record_id();
        if let Some(existing) = self.store.get_one(Collection::Files, &id)? {
            let existing_path = existing
                .get(FIELD_FILE_PATH)
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            if existing_path != record.canonical_path {
                log::warn!(
                    "Record id {} already holds {:?}; skipping {:?}",
                    id,
                    existing_path,
                    record.canonical_path
                );
            }
            return Ok(false);
        }
        self.store.put(Collection::Files, &id, to_document(&record)?)?;
        Ok(true)
    }

    /// Replace a file's metadata. A programme named in the metadata that the catalog does not
    /// know yet is registered on the way.
    pub fn set_file_metadata(&mut self, path: &str, metadata: Metadata) -> Result<FileRecord> {
        let mut record = self
            .find_file(path)?
            .ok_or_else(|| CatalogError::NotFound(format!("file {}", path)))?;

        let id = self.stored_id_for(&record)?;
        let value = serde_json::to_value(&metadata)?;
        self.store
            .patch(Collection::Files, &id, json!({ (FIELD_METADATA): value }))?;
        record.metadata = metadata;

        let programme = record
            .metadata
            .get(&self.labels.programme)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        if let Some(name) = programme {
            if self.find_programme_by_name(&name)?.is_none() {
                let registered = Programme::named(&name);
                self.store.put(
                    Collection::Programmes,
                    &registered.id,
                    to_document(&registered)?,
                )?;
                log::info!("Registered programme {:?} from file metadata", registered.name);
            }
        }

        log::info!("Saved metadata for {}", record.canonical_path);
        Ok(record)
    }

    /// Point a record at the file's location in a fresh selection. An exact path match wins;
    /// otherwise the one selected file with the same name is taken. The record moves to the id
    /// derived from its new path in one batch.
    pub fn relink_file(&mut self, path: &str, available: &[LocalFile]) -> Result<FileRecord> {
        let record = self
            .find_file(path)?
            .ok_or_else(|| CatalogError::NotFound(format!("file {}", path)))?;
        let matched = match access::resolve(&record.canonical_path, available) {
            Some(file) => file,
            None => find_by_name(&record.canonical_path, available)?,
        };

        let new_path = normalize_path(matched.relative_path());
        let old_id = self.stored_id_for(&record)?;
        let new_id = sanitize_id(&new_path);

        let moved = FileRecord {
            canonical_path: new_path,
            ..record
        };
        if new_id == old_id {
            self.store.put(Collection::Files, &new_id, to_document(&moved)?)?;
            return Ok(moved);
        }
        if self.store.get_one(Collection::Files, &new_id)?.is_some() {
            return Err(CatalogError::Conflict(format!("file {}", moved.canonical_path)));
        }

        self.store.atomic_batch(vec![
            BatchOp::delete(Collection::Files, old_id),
            BatchOp::put(Collection::Files, new_id, to_document(&moved)?),
        ])?;
        log::info!("Relinked file to {}", moved.canonical_path);
        Ok(moved)
    }

    /// Files awaiting archival, optionally limited to one disk.
    pub fn list_scanned_files(&self, disk_id: Option<&str>) -> Result<Vec<FileRecord>> {
        Ok(self
            .list_files()?
            .into_iter()
            .filter(|f| !f.is_archived())
            .filter(|f| disk_id.map_or(true, |d| f.disk_id == d))
            .collect())
    }

    pub fn list_archived_files(&self) -> Result<Vec<FileRecord>> {
        Ok(self
            .list_files()?
            .into_iter()
            .filter(FileRecord::is_archived)
            .collect())
    }

    /// Distinct disk ids referenced by files, in first-seen order.
    pub fn disk_ids_from_files(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = Vec::new();
        for record in self.list_files()? {
            if !record.disk_id.is_empty() && !ids.contains(&record.disk_id) {
                ids.push(record.disk_id);
            }
        }
        Ok(ids)
    }

    /// The id a found record is actually stored under.
    fn stored_id_for(&self, record: &FileRecord) -> Result<String> {
        let derived = record.record_id();
        if let Some(document) = self.store.get_one(Collection::Files, &derived)? {
            let stored_path = document.get(FIELD_FILE_PATH).and_then(|v| v.as_str());
            if stored_path == Some(record.canonical_path.as_str()) {
                return Ok(derived);
            }
        }
        self.store
            .query(
                Collection::Files,
                &[Predicate::eq(FIELD_FILE_PATH, record.canonical_path.clone())],
            )?
            .into_iter()
            .next()
            .map(|entry| entry.id)
            .ok_or_else(|| CatalogError::NotFound(format!("file {}", record.canonical_path)))
    }

    // ----- Disks -----

    pub fn list_disks(&self) -> Result<Vec<Disk>> {
        Ok(self
            .store
            .get(Collection::Disks)?
            .into_iter()
            .map(disk_from_entry)
            .collect())
    }

    pub fn add_disk(&mut self, id: &str) -> Result<Disk> {
        let id = required(id, "disk id")?;
        if self.find_disk_ci(&id)?.is_some() {
            return Err(CatalogError::Conflict(format!("disk {}", id)));
        }

        let disk = Disk { id };
        self.store.put(Collection::Disks, &disk.id, to_document(&disk)?)?;
        log::info!("Added disk {}", disk.id);
        Ok(disk)
    }

    /// Rename a disk. File records keep the disk id they were scanned with.
    pub fn rename_disk(&mut self, old_id: &str, new_id: &str) -> Result<Disk> {
        let new_id = required(new_id, "disk id")?;
        if self.store.get_one(Collection::Disks, old_id)?.is_none() {
            return Err(CatalogError::NotFound(format!("disk {}", old_id)));
        }
        if let Some(other) = self.find_disk_ci(&new_id)? {
            if other.id != old_id {
                return Err(CatalogError::Conflict(format!("disk {}", new_id)));
            }
        }

        let disk = Disk { id: new_id };
        if disk.id != old_id {
            self.store.atomic_batch(vec![
                BatchOp::delete(Collection::Disks, old_id),
                BatchOp::put(Collection::Disks, disk.id.clone(), to_document(&disk)?),
            ])?;
            log::info!("Renamed disk {} to {}", old_id, disk.id);
        }
        Ok(disk)
    }

    pub fn delete_disk(&mut self, id: &str) -> Result<()> {
        if self.store.get_one(Collection::Disks, id)?.is_none() {
            return Err(CatalogError::NotFound(format!("disk {}", id)));
        }
        self.store.delete(Collection::Disks, id)?;
        log::info!("Deleted disk {}", id);
        Ok(())
    }

    fn find_disk_ci(&self, id: &str) -> Result<Option<Disk>> {
        let wanted = id.to_lowercase();
        Ok(self
            .list_disks()?
            .into_iter()
            .find(|d| d.id.to_lowercase() == wanted))
    }

    // ----- Programmes -----

    pub fn list_programmes(&self) -> Result<Vec<Programme>> {
        Ok(self
            .store
            .get(Collection::Programmes)?
            .into_iter()
            .map(programme_from_entry)
            .collect())
    }

    pub fn add_programme(&mut self, name: &str) -> Result<Programme> {
        let name = required(name, "programme name")?;
        if self.find_programme_by_name(&name)?.is_some() {
            return Err(CatalogError::Conflict(format!("programme {}", name)));
        }

        let programme = Programme::named(&name);
        self.store.put(
            Collection::Programmes,
            &programme.id,
            to_document(&programme)?,
        )?;
        log::info!("Added programme {}", programme.name);
        Ok(programme)
    }

    /// Rename keeps the programme's id.
    pub fn rename_programme(&mut self, id: &str, new_name: &str) -> Result<Programme> {
        let new_name = required(new_name, "programme name")?;
        if self.store.get_one(Collection::Programmes, id)?.is_none() {
            return Err(CatalogError::NotFound(format!("programme {}", id)));
        }
        if let Some(other) = self.find_programme_by_name(&new_name)? {
            if other.id != id {
                return Err(CatalogError::Conflict(format!("programme {}", new_name)));
            }
        }

        self.store
            .patch(Collection::Programmes, id, json!({ (FIELD_NAME): &new_name }))?;
        Ok(Programme {
            id: id.to_string(),
            name: new_name,
        })
    }

    /// Files that mention the programme keep their metadata.
    pub fn delete_programme(&mut self, id: &str) -> Result<()> {
        if self.store.get_one(Collection::Programmes, id)?.is_none() {
            return Err(CatalogError::NotFound(format!("programme {}", id)));
        }
        self.store.delete(Collection::Programmes, id)?;
        log::info!("Deleted programme {}", id);
        Ok(())
    }

    pub fn find_programme_by_name(&self, name: &str) -> Result<Option<Programme>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .list_programmes()?
            .into_iter()
            .find(|p| p.name.to_lowercase() == wanted))
    }
}

/// The single selected file whose name matches the last segment of `path`.
fn find_by_name<'a>(path: &str, available: &'a [LocalFile]) -> Result<&'a LocalFile> {
    let wanted = normalize_path(display_name(path));
    let mut candidates = available
        .iter()
        .filter(|f| display_name(&normalize_path(f.relative_path())) == wanted);

    match (candidates.next(), candidates.next()) {
        (Some(file), None) => Ok(file),
        (Some(_), Some(_)) => Err(CatalogError::Conflict(format!(
            "more than one selected file is named {}",
            wanted
        ))),
        _ => Err(CatalogError::NotFound(format!("{} is not in the selected folder", path))),
    }
}

/// Copy of the record with its path in canonical form.
fn canonical_record(record: &FileRecord) -> Result<FileRecord> {
    let canonical_path = normalize_path(&record.canonical_path);
    if canonical_path.is_empty() {
        return Err(CatalogError::Validation("file path must not be empty".to_string()));
    }
    Ok(FileRecord {
        canonical_path,
        ..record.clone()
    })
}

fn required(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

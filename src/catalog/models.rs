// Catalog entities and their stored document shapes

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::FIELD_NAME;
use crate::error::{CatalogError, Result};
use crate::identity::sanitize_id;
use crate::store::{Collection, DocumentEntry};

/// Free-form annotations on a file, in the order they were entered. Empty means not yet
/// archived.
pub type Metadata = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "filePath")]
    pub canonical_path: String,
    #[serde(rename = "diskId", default)]
    pub disk_id: String,
    #[serde(default, deserialize_with = "lenient_metadata")]
    pub metadata: Metadata,
}

impl FileRecord {
    pub fn scanned(canonical_path: impl Into<String>, disk_id: impl Into<String>) -> Self {
        Self {
            canonical_path: canonical_path.into(),
            disk_id: disk_id.into(),
            metadata: Metadata::new(),
        }
    }

    /// Storage key; always derived, never stored.
    pub fn record_id(&self) -> String {
        sanitize_id(&self.canonical_path)
    }

    pub fn is_archived(&self) -> bool {
        !self.metadata.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Programme {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Programme {
    pub fn named(name: &str) -> Self {
        let name = name.trim();
        Self {
            id: sanitize_id(name),
            name: name.to_string(),
        }
    }
}

/// Metadata written by older clients can hold numbers (episode numbers) or nulls.
fn lenient_metadata<'de, D>(deserializer: D) -> std::result::Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Map<String, Value>> = Option::deserialize(deserializer)?;
    let mut metadata = Metadata::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            other => other.to_string(),
        };
        metadata.insert(key, text);
    }
    Ok(metadata)
}

pub(crate) fn to_document<T: Serialize>(entity: &T) -> Result<Value> {
    Ok(serde_json::to_value(entity)?)
}

pub(crate) fn from_entry<T: for<'de> Deserialize<'de>>(collection: Collection, entry: DocumentEntry) -> Result<T> {
    serde_json::from_value(entry.document).map_err(|e| {
        CatalogError::TransientIo(format!("malformed document {}/{}: {}", collection, entry.id, e))
    })
}

/// Disks are listed by document id; older documents may lack the `id` field.
pub(crate) fn disk_from_entry(entry: DocumentEntry) -> Disk {
    Disk { id: entry.id }
}

/// Programmes keep their document id even when the body disagrees.
pub(crate) fn programme_from_entry(entry: DocumentEntry) -> Programme {
    let name = entry
        .document
        .get(FIELD_NAME)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Programme { id: entry.id, name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_record_document_shape() {
        let mut record = FileRecord::scanned("news/ep 1.mp4", "D1");
        assert_eq!(record.record_id(), "news_ep_1.mp4");
        assert!(!record.is_archived());

        record.metadata.insert("Name of Programme".into(), "News".into());
        assert!(record.is_archived());

        let doc = to_document(&record).unwrap();
        assert_eq!(
            doc,
            json!({"filePath": "news/ep 1.mp4", "diskId": "D1", "metadata": {"Name of Programme": "News"}})
        );
    }

    #[test]
    fn test_lenient_metadata_values() {
        let doc = json!({
            "filePath": "a.mp4",
            "diskId": "D1",
            "metadata": {"Episode Number": 5, "Flag": true, "Gone": null, "Note": "x"}
        });
        let record: FileRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.metadata.get("Episode Number").unwrap(), "5");
        assert_eq!(record.metadata.get("Flag").unwrap(), "true");
        assert!(!record.metadata.contains_key("Gone"));

        let bare: FileRecord = serde_json::from_value(json!({"filePath": "b.mp4", "metadata": null})).unwrap();
        assert!(bare.metadata.is_empty());
        assert_eq!(bare.disk_id, "");
    }

    #[test]
    fn test_programme_named_trims_and_sanitizes() {
        let programme = Programme::named("  Evening News: Late ");
        assert_eq!(programme.name, "Evening News: Late");
        assert_eq!(programme.id, "Evening_News__Late");
    }

    #[test]
    fn test_entries_keep_document_id() {
        let disk = disk_from_entry(DocumentEntry { id: "D7".into(), document: json!({}) });
        assert_eq!(disk.id, "D7");

        let programme = programme_from_entry(DocumentEntry {
            id: "News".into(),
            document: json!({"id": "Other", "name": "News"}),
        });
        assert_eq!(programme.id, "News");
        assert_eq!(programme.name, "News");
    }
}

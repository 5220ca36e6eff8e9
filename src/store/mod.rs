// Persistence port
// Collection-based document store the catalog talks to. Documents are JSON objects keyed by id
// within a collection; enumeration order is insertion order.

pub mod memory;
pub mod migrations;
pub mod sqlite;

use serde_json::{Map, Value};
use std::fmt;

use crate::constants::{DISKS_COLLECTION, FILES_COLLECTION, PROGRAMMES_COLLECTION};
use crate::error::{CatalogError, Result};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Files,
    Disks,
    Programmes,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Files, Collection::Programmes, Collection::Disks];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Files => FILES_COLLECTION,
            Collection::Disks => DISKS_COLLECTION,
            Collection::Programmes => PROGRAMMES_COLLECTION,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEntry {
    pub id: String,
    pub document: Value,
}

/// Equality on a dotted field path, e.g. `diskId` or `metadata.Telecast Date`.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub equals: Value,
}

impl Predicate {
    pub fn eq(field: impl Into<String>, equals: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            equals: equals.into(),
        }
    }

    pub fn matches(&self, document: &Value) -> bool {
        let mut current = document;
        for segment in self.field.split('.') {
            match current.get(segment) {
                Some(next) => current = next,
                None => return false,
            }
        }
        *current == self.equals
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    Put {
        collection: Collection,
        id: String,
        document: Value,
    },
    Delete {
        collection: Collection,
        id: String,
    },
}

impl BatchOp {
    pub fn put(collection: Collection, id: impl Into<String>, document: Value) -> Self {
        BatchOp::Put {
            collection,
            id: id.into(),
            document,
        }
    }

    pub fn delete(collection: Collection, id: impl Into<String>) -> Self {
        BatchOp::Delete {
            collection,
            id: id.into(),
        }
    }
}

pub trait DocumentStore {
    /// Every document in the collection, in enumeration order.
    fn get(&self, collection: Collection) -> Result<Vec<DocumentEntry>>;

    fn get_one(&self, collection: Collection, id: &str) -> Result<Option<Value>>;

    /// Documents matching every predicate.
    fn query(&self, collection: Collection, predicates: &[Predicate]) -> Result<Vec<DocumentEntry>> {
        let entries = self.get(collection)?;
        Ok(entries
            .into_iter()
            .filter(|entry| predicates.iter().all(|p| p.matches(&entry.document)))
            .collect())
    }

    /// Create or fully replace a document.
    fn put(&mut self, collection: Collection, id: &str, document: Value) -> Result<()>;

    /// Merge top-level fields into an existing document.
    fn patch(&mut self, collection: Collection, id: &str, partial: Value) -> Result<()> {
        let mut current = self
            .get_one(collection, id)?
            .ok_or_else(|| CatalogError::NotFound(format!("{}/{}", collection, id)))?;
        merge_top_level(&mut current, partial)?;
        self.put(collection, id, current)
    }

    /// Removing an absent document is not an error.
    fn delete(&mut self, collection: Collection, id: &str) -> Result<()>;

    /// Apply all operations or none of them.
    fn atomic_batch(&mut self, ops: Vec<BatchOp>) -> Result<()>;
}

/// Shallow merge used by `patch`.
pub(crate) fn merge_top_level(target: &mut Value, partial: Value) -> Result<()> {
    let fields = match partial {
        Value::Object(fields) => fields,
        _ => return Err(CatalogError::Validation("patch must be an object".to_string())),
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(existing) = target {
        for (key, value) in fields {
            existing.insert(key, value);
        }
    }
    Ok(())
}

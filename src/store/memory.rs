// In-process document store with the same semantics as the SQLite adapter

use serde_json::Value;
use std::collections::HashMap;

use super::{BatchOp, Collection, DocumentEntry, DocumentStore};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashMap<Collection, Vec<DocumentEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(collections: &mut HashMap<Collection, Vec<DocumentEntry>>, op: BatchOp) {
        match op {
            BatchOp::Put { collection, id, document } => {
                let entries = collections.entry(collection).or_default();
                match entries.iter_mut().find(|e| e.id == id) {
                    Some(existing) => existing.document = document,
                    None => entries.push(DocumentEntry { id, document }),
                }
            }
            BatchOp::Delete { collection, id } => {
                if let Some(entries) = collections.get_mut(&collection) {
                    entries.retain(|e| e.id != id);
                }
            }
        }
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: Collection) -> Result<Vec<DocumentEntry>> {
        Ok(self.collections.get(&collection).cloned().unwrap_or_default())
    }

    fn get_one(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        Ok(self
            .collections
            .get(&collection)
            .and_then(|entries| entries.iter().find(|e| e.id == id))
            .map(|e| e.document.clone()))
    }

    fn put(&mut self, collection: Collection, id: &str, document: Value) -> Result<()> {
        Self::apply(&mut self.collections, BatchOp::put(collection, id, document));
        Ok(())
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Result<()> {
        Self::apply(&mut self.collections, BatchOp::delete(collection, id));
        Ok(())
    }

    fn atomic_batch(&mut self, ops: Vec<BatchOp>) -> Result<()> {
        let mut staged = self.collections.clone();
        for op in ops {
            Self::apply(&mut staged, op);
        }
        self.collections = staged;
        Ok(())
    }
}

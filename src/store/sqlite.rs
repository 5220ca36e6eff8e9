// SQLite document store
// One `documents` table holds all three collections. Bodies are JSON text.

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

use super::{migrations, BatchOp, Collection, DocumentEntry, DocumentStore};
use crate::error::{CatalogError, Result};

const UPSERT_SQL: &str = "INSERT INTO documents (collection, doc_id, body) VALUES (?1, ?2, ?3)
     ON CONFLICT(collection, doc_id) DO UPDATE SET body = excluded.body, updated_at = datetime('now')";
const DELETE_SQL: &str = "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Option<Connection>,
}

impl SqliteStore {
    /// Open or create a catalog database at the given path
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        migrations::run_migrations(&conn)?;

        log::debug!("Opened catalog at {}", db_path.display());
        Ok(Self { conn: Some(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn: Some(conn) })
    }

    /// Drop the connection. Later calls fail with `NotInitialized`.
    pub fn close(&mut self) {
        self.conn = None;
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(CatalogError::NotInitialized)
    }
}

fn parse_body(collection: Collection, id: &str, body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| {
        CatalogError::TransientIo(format!("corrupt document {}/{}: {}", collection, id, e))
    })
}

impl DocumentStore for SqliteStore {
    fn get(&self, collection: Collection) -> Result<Vec<DocumentEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT doc_id, body FROM documents WHERE collection = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![collection.name()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let document = parse_body(collection, &id, &body)?;
            entries.push(DocumentEntry { id, document });
        }
        Ok(entries)
    }

    fn get_one(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let conn = self.conn()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2",
                params![collection.name(), id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| parse_body(collection, id, &b)).transpose()
    }

    fn put(&mut self, collection: Collection, id: &str, document: Value) -> Result<()> {
        let body = serde_json::to_string(&document)?;
        self.conn()?
            .execute(UPSERT_SQL, params![collection.name(), id, body])?;
        Ok(())
    }

    fn delete(&mut self, collection: Collection, id: &str) -> Result<()> {
        self.conn()?
            .execute(DELETE_SQL, params![collection.name(), id])?;
        Ok(())
    }

    fn atomic_batch(&mut self, ops: Vec<BatchOp>) -> Result<()> {
        let conn = self.conn.as_mut().ok_or(CatalogError::NotInitialized)?;
        let tx = conn.transaction()?;
        for op in &ops {
            match op {
                BatchOp::Put { collection, id, document } => {
                    let body = serde_json::to_string(document)?;
                    tx.execute(UPSERT_SQL, params![collection.name(), id, body])?;
                }
                BatchOp::Delete { collection, id } => {
                    tx.execute(DELETE_SQL, params![collection.name(), id])?;
                }
            }
        }
        tx.commit()?;
        log::debug!("Committed batch of {} operations", ops.len());
        Ok(())
    }
}

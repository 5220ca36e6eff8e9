// Catalog database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use rusqlite::Connection;

use crate::error::{CatalogError, Result};

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: document table
    r#"
    CREATE TABLE documents (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        collection TEXT NOT NULL CHECK (collection IN ('files', 'disks', 'programmes')),
        doc_id TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(collection, doc_id)
    );

    CREATE INDEX idx_documents_collection ON documents(collection, seq);
    "#,
];

/// Get current schema version from database
pub fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a catalog created by a newer build
    if current_version > target_version {
        return Err(CatalogError::Validation(format!(
            "catalog schema version {} is newer than this build supports (max {})",
            current_version, target_version
        )));
    }

    if current_version == target_version {
        return Ok(());
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;

        log::info!("Applied catalog migration {}", migration_version);
    }

    Ok(())
}

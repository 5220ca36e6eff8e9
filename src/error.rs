// Telecast Catalog Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog store is not initialized")]
    NotInitialized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    TransientIo(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A scan stopped part way; upserts before `processed` were kept.
    #[error("Scan aborted after {processed} of {total} files: {source}")]
    Reconcile {
        processed: usize,
        total: usize,
        #[source]
        source: Box<CatalogError>,
    },

    #[error("Restore failed: {0}")]
    RestoreFailed(#[source] Box<CatalogError>),
}

impl CatalogError {
    /// True for failures of the storage layer itself rather than of the request.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::TransientIo(_)
            | CatalogError::Database(_)
            | CatalogError::Io(_)
            | CatalogError::Csv(_) => true,
            CatalogError::Reconcile { source, .. } | CatalogError::RestoreFailed(source) => {
                source.is_transient()
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CatalogError::TransientIo("timeout".into()).is_transient());
        assert!(!CatalogError::Conflict("D1".into()).is_transient());
        assert!(!CatalogError::NotInitialized.is_transient());

        let aborted = CatalogError::Reconcile {
            processed: 2,
            total: 5,
            source: Box::new(CatalogError::TransientIo("connection reset".into())),
        };
        assert!(aborted.is_transient());
        assert_eq!(
            aborted.to_string(),
            "Scan aborted after 2 of 5 files: Storage error: connection reset"
        );
    }
}

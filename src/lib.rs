// Telecast Catalog - Library Entry Point

pub mod access;
pub mod backup;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod identity;
pub mod metadata;
pub mod scan;
pub mod search;
pub mod source;
pub mod store;

pub use catalog::{Catalog, Disk, FileRecord, Metadata, Programme};
pub use config::{CatalogConfig, FieldLabels};
pub use error::{CatalogError, Result};
pub use scan::{reconcile, ScanProgress, ScanReport};
pub use search::{search, Combinator, SearchHit, SearchQuery};
pub use source::{discover_local_files, LocalFile};
pub use store::{DocumentStore, MemoryStore, SqliteStore};

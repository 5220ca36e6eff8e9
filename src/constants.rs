// Telecast Catalog Constants
// Collection names and field labels are part of the stored document format. Do not change
// them without a migration for existing catalogs and snapshots.

// Collections
pub const FILES_COLLECTION: &str = "files";
pub const DISKS_COLLECTION: &str = "disks";
pub const PROGRAMMES_COLLECTION: &str = "programmes";

// Stored document field names
pub const FIELD_FILE_PATH: &str = "filePath";
pub const FIELD_METADATA: &str = "metadata";
pub const FIELD_NAME: &str = "name";

// Well-known metadata labels (presentation labels, configurable via FieldLabels)
pub const LABEL_PROGRAMME: &str = "Name of Programme";
pub const LABEL_EPISODE_NUMBER: &str = "Episode Number";
pub const LABEL_TELECAST_DATE: &str = "Telecast Date";
pub const LABEL_EPISODE_DETAILS: &str = "Episode Details";

// Scan noise filter
pub const NOISE_EXTENSIONS: [&str; 5] = [".tmp", ".ds_store", ".ini", ".db", ".lnk"];
pub const NOISE_FILE_NAMES: [&str; 2] = ["thumbs.db", "desktop.ini"];

// Search projection
pub const METADATA_PAIR_SEPARATOR: &str = "; ";

// CSV export
pub const CSV_PATH_HEADER: &str = "File Path";
pub const CSV_DISK_HEADER: &str = "Disk ID";

// Paths
pub const APP_QUALIFIER: &str = "org";
pub const APP_ORGANIZATION: &str = "telecast";
pub const APP_NAME: &str = "telecast-catalog";
pub const DB_FILENAME: &str = "catalog.db";
pub const CONFIG_FILENAME: &str = "config.json";
pub const BACKUP_FILE_PREFIX: &str = "catalog_backup_";
pub const EXPORT_FILENAME: &str = "metadata_export.csv";

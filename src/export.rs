// CSV export of archived files

use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::Path;

use crate::catalog::{Catalog, FileRecord};
use crate::constants::{CSV_DISK_HEADER, CSV_PATH_HEADER};
use crate::error::{CatalogError, Result};
use crate::store::DocumentStore;

/// Metadata columns: the union of keys over the records, in first-seen order.
pub fn metadata_columns<'a>(records: impl IntoIterator<Item = &'a FileRecord>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.metadata.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Render archived records as CSV. Records without metadata are skipped; every field is quoted
/// and every row ends with CRLF.
pub fn export_csv(records: &[FileRecord]) -> Result<String> {
    let archived: Vec<&FileRecord> = records.iter().filter(|r| r.is_archived()).collect();
    let columns = metadata_columns(archived.iter().copied());

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    let mut header = vec![CSV_PATH_HEADER.to_string(), CSV_DISK_HEADER.to_string()];
    header.extend(columns.iter().cloned());
    writer.write_record(&header)?;

    for record in &archived {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.canonical_path.as_str());
        row.push(record.disk_id.as_str());
        for column in &columns {
            row.push(record.metadata.get(column).map(String::as_str).unwrap_or(""));
        }
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| CatalogError::Io(e.into_error()))?;
    log::debug!("Exported {} archived files, {} metadata columns", archived.len(), columns.len());
    String::from_utf8(bytes).map_err(|e| CatalogError::Validation(format!("export is not UTF-8: {}", e)))
}

/// Export every archived file in the catalog to `path`. Returns the number of rows written.
pub fn export_catalog_csv<S: DocumentStore>(catalog: &Catalog<S>, path: &Path) -> Result<usize> {
    let archived = catalog.list_archived_files()?;
    let text = export_csv(&archived)?;
    std::fs::write(path, text)?;
    log::info!("Wrote {} rows to {}", archived.len(), path.display());
    Ok(archived.len())
}

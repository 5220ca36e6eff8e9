// Scan reconciliation
// Merges a freshly enumerated disk into the catalog. Existing records are never touched:
// metadata survives rescans and the first disk to report a path keeps it.

pub mod filter;
pub mod progress;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, FileRecord};
use crate::error::{CatalogError, Result};
use crate::identity::normalize_path;
use crate::source::LocalFile;
use crate::store::DocumentStore;

pub use filter::is_noise_entry;
pub use progress::ScanProgress;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Entries left after filtering.
    pub total_files: usize,
    pub inserted: usize,
    pub already_cataloged: usize,
    pub filtered_out: usize,
}

/// Entries that survive the noise filter, in input order.
pub fn filter_entries(entries: &[LocalFile]) -> Vec<&LocalFile> {
    entries
        .iter()
        .filter(|entry| {
            let noise = is_noise_entry(entry.relative_path());
            if noise {
                log::debug!("Skipping noise entry {}", entry.relative_path());
            }
            !noise
        })
        .collect()
}

/// Reconcile one disk's enumeration into the catalog, one upsert at a time in input order.
///
/// A storage failure stops the scan; records written before it stay written and the error
/// reports how far the scan got.
pub fn reconcile<S: DocumentStore>(
    catalog: &mut Catalog<S>,
    disk_id: &str,
    entries: &[LocalFile],
    on_progress: &mut dyn FnMut(&ScanProgress),
) -> Result<ScanReport> {
    let disk_id = disk_id.trim();
    if disk_id.is_empty() {
        return Err(CatalogError::Validation("disk id must not be empty".to_string()));
    }

    let kept = filter_entries(entries);
    let mut report = ScanReport {
        total_files: kept.len(),
        filtered_out: entries.len() - kept.len(),
        ..Default::default()
    };

    log::info!(
        "Scanning {} files for disk {} ({} filtered)",
        report.total_files,
        disk_id,
        report.filtered_out
    );

    for (index, entry) in kept.iter().enumerate() {
        let canonical = normalize_path(entry.relative_path());
        if canonical.is_empty() {
            report.already_cataloged += 1;
        } else {
            let record = FileRecord::scanned(canonical, disk_id);
            match catalog.insert_file_if_absent(&record) {
                Ok(true) => report.inserted += 1,
                Ok(false) => report.already_cataloged += 1,
                Err(e) => {
                    log::error!("Scan of disk {} failed at {}: {}", disk_id, record.canonical_path, e);
                    return Err(CatalogError::Reconcile {
                        processed: index,
                        total: report.total_files,
                        source: Box::new(e),
                    });
                }
            }
        }

        on_progress(&ScanProgress::new(disk_id, index + 1, report.total_files));
    }

    log::info!(
        "Scan of disk {} complete: {} new, {} already cataloged",
        disk_id,
        report.inserted,
        report.already_cataloged
    );
    Ok(report)
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

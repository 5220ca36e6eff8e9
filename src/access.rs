// Accessibility resolution
// Maps a catalog path onto a file in the current local selection. Pure; no I/O.

use crate::identity::normalize_path;
use crate::source::LocalFile;

/// First available file whose normalized relative path equals `canonical_path`.
pub fn resolve<'a>(canonical_path: &str, available: &'a [LocalFile]) -> Option<&'a LocalFile> {
    let wanted = normalize_path(canonical_path);
    available
        .iter()
        .find(|file| normalize_path(file.relative_path()) == wanted)
}

pub fn is_accessible(canonical_path: &str, available: &[LocalFile]) -> bool {
    resolve(canonical_path, available).is_some()
}

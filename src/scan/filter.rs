// Scan noise filter
// Drops OS and editor litter from a selection before it reaches the catalog.

use crate::constants::{NOISE_EXTENSIONS, NOISE_FILE_NAMES};

/// True when the relative path names a file that should never be cataloged.
pub fn is_noise_entry(relative_path: &str) -> bool {
    let lower = relative_path.to_lowercase();

    if NOISE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }

    let name = lower.rsplit(['/', '\\']).next().unwrap_or(&lower);
    if NOISE_FILE_NAMES.contains(&name) {
        return true;
    }

    // Dotfiles and anything inside a hidden folder
    lower
        .split(['/', '\\'])
        .any(|segment| segment.starts_with('.'))
}

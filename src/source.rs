// Local file source
// File handles exposed by a local selection, and directory discovery that produces them.

use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CatalogError, Result};

/// A file offered by the local selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Bare file name.
    pub name: String,
    /// Path relative to the selected folder, including the folder name. Absent when a single
    /// file was picked.
    pub relative_path: Option<String>,
    /// Where the bytes live on this machine.
    pub location: PathBuf,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, relative_path: Option<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            relative_path,
            location: location.into(),
        }
    }

    /// Folder-relative path when present, else the bare name.
    pub fn relative_path(&self) -> &str {
        match self.relative_path.as_deref() {
            Some(rel) if !rel.is_empty() => rel,
            _ => &self.name,
        }
    }

    /// Open the byte stream behind this handle.
    pub fn open(&self) -> std::io::Result<File> {
        File::open(&self.location)
    }
}

/// Enumerate every file under `root` the way a folder picker reports it: relative paths start
/// with the folder's own name and use forward slashes. A plain file yields a single handle
/// without a relative path.
pub fn discover_local_files(root: &Path) -> Result<Vec<LocalFile>> {
    if root.is_file() {
        let name = file_name_of(root);
        return Ok(vec![LocalFile::new(name, None, root)]);
    }

    if !root.is_dir() {
        return Err(CatalogError::NotFound(format!("{}", root.display())));
    }

    let folder = file_name_of(root);
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let inner = match path.strip_prefix(root) {
            Ok(inner) => inner,
            Err(_) => continue,
        };

        let mut relative = folder.clone();
        for component in inner.components() {
            relative.push('/');
            relative.push_str(&component.as_os_str().to_string_lossy());
        }

        files.push(LocalFile::new(file_name_of(path), Some(relative), path));
    }

    // Sort by relative path for consistent ordering
    files.sort_by(|a, b| a.relative_path().cmp(b.relative_path()));

    log::debug!("Discovered {} files under {}", files.len(), root.display());
    Ok(files)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

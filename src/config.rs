// Catalog configuration
// Stored as JSON in the platform config directory. Missing files fall back to defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    APP_NAME, APP_ORGANIZATION, APP_QUALIFIER, CONFIG_FILENAME, DB_FILENAME, LABEL_EPISODE_DETAILS,
    LABEL_EPISODE_NUMBER, LABEL_PROGRAMME, LABEL_TELECAST_DATE,
};
use crate::error::{CatalogError, Result};

/// Metadata keys the catalog gives meaning to. Everything else is free-form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldLabels {
    pub programme: String,
    pub episode_number: String,
    pub telecast_date: String,
    pub episode_details: String,
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self {
            programme: LABEL_PROGRAMME.to_string(),
            episode_number: LABEL_EPISODE_NUMBER.to_string(),
            telecast_date: LABEL_TELECAST_DATE.to_string(),
            episode_details: LABEL_EPISODE_DETAILS.to_string(),
        }
    }
}

impl FieldLabels {
    pub fn is_well_known(&self, key: &str) -> bool {
        key == self.programme
            || key == self.episode_number
            || key == self.telecast_date
            || key == self.episode_details
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogConfig {
    /// Catalog database file. Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    pub fields: FieldLabels,
}

impl CatalogConfig {
    /// Load from `path`, or from the default location when `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|e| {
            CatalogError::Validation(format!("config {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Configured database path, else `<data dir>/catalog.db`, else `./catalog.db`.
    pub fn resolve_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().join(DB_FILENAME))
            .unwrap_or_else(|| PathBuf::from(DB_FILENAME))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

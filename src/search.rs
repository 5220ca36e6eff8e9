// Search engine
// Evaluates a structured query against every file record. Each criterion that is set becomes
// one predicate; the combinator joins them. Results keep catalog order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{Catalog, FileRecord};
use crate::config::FieldLabels;
use crate::constants::METADATA_PAIR_SEPARATOR;
use crate::error::{CatalogError, Result};
use crate::metadata::parse_episode_number;
use crate::store::DocumentStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl FromStr for Combinator {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Combinator::And),
            "OR" => Ok(Combinator::Or),
            other => Err(CatalogError::Validation(format!("unknown combinator {:?}", other))),
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => f.write_str("AND"),
            Combinator::Or => f.write_str("OR"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub disk_id: Option<String>,
    pub programme_name: Option<String>,
    pub episode_number: Option<u32>,
    pub telecast_date: Option<String>,
    pub metadata_substring: Option<String>,
    pub combinator: Combinator,
}

/// The searchable view of one file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub file_path: String,
    pub disk_id: String,
    pub programme_name: String,
    pub episode_number: String,
    pub telecast_date: String,
    /// Every metadata pair as `key: value`, joined with `; `.
    pub metadata_text: String,
}

pub fn project(record: &FileRecord, labels: &FieldLabels) -> SearchHit {
    let field = |key: &str| record.metadata.get(key).cloned().unwrap_or_default();
    let metadata_text = record
        .metadata
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(METADATA_PAIR_SEPARATOR);

    SearchHit {
        file_path: record.canonical_path.clone(),
        disk_id: record.disk_id.clone(),
        programme_name: field(&labels.programme),
        episode_number: field(&labels.episode_number),
        telecast_date: field(&labels.telecast_date),
        metadata_text,
    }
}

fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SearchQuery {
    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        set(&self.disk_id).is_none()
            && set(&self.programme_name).is_none()
            && self.episode_number.is_none()
            && set(&self.telecast_date).is_none()
            && set(&self.metadata_substring).is_none()
    }

    /// Evaluate the set criteria against one projection. Unset criteria never constrain: with
    /// nothing set every record matches under either combinator.
    pub fn matches(&self, hit: &SearchHit) -> bool {
        let mut outcomes: Vec<bool> = Vec::with_capacity(5);

        if let Some(disk) = set(&self.disk_id) {
            outcomes.push(hit.disk_id.to_lowercase() == disk.to_lowercase());
        }
        if let Some(programme) = set(&self.programme_name) {
            outcomes.push(hit.programme_name.to_lowercase() == programme.to_lowercase());
        }
        if let Some(episode) = self.episode_number {
            outcomes.push(parse_episode_number(&hit.episode_number) == Some(f64::from(episode)));
        }
        if let Some(date) = set(&self.telecast_date) {
            outcomes.push(hit.telecast_date.to_lowercase() == date.to_lowercase());
        }
        if let Some(text) = set(&self.metadata_substring) {
            outcomes.push(hit.metadata_text.to_lowercase().contains(&text.to_lowercase()));
        }

        if outcomes.is_empty() {
            return true;
        }
        match self.combinator {
            Combinator::And => outcomes.iter().all(|o| *o),
            Combinator::Or => outcomes.iter().any(|o| *o),
        }
    }
}

/// Run a query over the whole catalog.
pub fn search<S: DocumentStore>(catalog: &Catalog<S>, query: &SearchQuery) -> Result<Vec<SearchHit>> {
    let labels = catalog.labels();
    let hits: Vec<SearchHit> = catalog
        .list_files()?
        .iter()
        .map(|record| project(record, labels))
        .filter(|hit| query.matches(hit))
        .collect();

    log::debug!("Search ({}) matched {} files", query.combinator, hits.len());
    Ok(hits)
}

// Editorial metadata helpers
// Assembles the metadata map from the well-known fields plus custom pairs, and reads the
// well-known fields back out of a stored map.

use serde::{Deserialize, Serialize};

use crate::catalog::Metadata;
use crate::config::FieldLabels;

/// Editable view of a file's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataForm {
    pub programme: String,
    pub episode_number: Option<u32>,
    pub telecast_date: String,
    pub episode_details: String,
    pub custom: Vec<(String, String)>,
}

impl MetadataForm {
    /// Build the stored map. Empty fields are left out, so an all-empty form yields an empty
    /// map and the file reads as not archived.
    pub fn to_metadata(&self, labels: &FieldLabels) -> Metadata {
        let mut metadata = Metadata::new();

        if !self.programme.is_empty() {
            metadata.insert(labels.programme.clone(), self.programme.clone());
        }
        if let Some(episode) = self.episode_number.filter(|n| *n != 0) {
            metadata.insert(labels.episode_number.clone(), episode.to_string());
        }
        if !self.episode_details.is_empty() {
            metadata.insert(labels.episode_details.clone(), self.episode_details.clone());
        }
        if !self.telecast_date.is_empty() {
            metadata.insert(
                labels.telecast_date.clone(),
                normalize_telecast_date(&self.telecast_date),
            );
        }

        for (key, value) in &self.custom {
            if !key.is_empty() && !value.is_empty() {
                metadata.insert(key.clone(), value.clone());
            }
        }

        metadata
    }

    pub fn from_metadata(metadata: &Metadata, labels: &FieldLabels) -> Self {
        let field = |key: &str| metadata.get(key).cloned().unwrap_or_default();

        Self {
            programme: field(&labels.programme),
            episode_number: metadata
                .get(&labels.episode_number)
                .and_then(|v| v.trim().parse::<u32>().ok()),
            telecast_date: field(&labels.telecast_date),
            episode_details: field(&labels.episode_details),
            custom: metadata
                .iter()
                .filter(|(k, _)| !labels.is_well_known(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Numeric reading of an episode value; "5", " 05 " and "5.0" all read as 5.
pub fn parse_episode_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Bring "20190704" into "2019-07-04" form. Anything that is not a recognisable calendar date
/// is kept verbatim, since telecast dates are free text in older catalogs.
pub fn normalize_telecast_date(value: &str) -> String {
    let trimmed = value.trim();
    for format in ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"] {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    value.to_string()
}

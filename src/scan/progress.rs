// Scan progress payload

use serde::Serialize;

/// Progress reported after each file of a scan. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    pub disk_id: String,
    pub current: usize,
    pub total: usize,
    pub percent: f64,
}

impl ScanProgress {
    pub fn new(disk_id: impl Into<String>, current: usize, total: usize) -> Self {
        let total_safe = total.max(1);
        let percent = (current as f64 / total_safe as f64) * 100.0;
        Self {
            disk_id: disk_id.into(),
            current,
            total,
            percent: percent.min(100.0),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

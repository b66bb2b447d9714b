use std::collections::BTreeMap;

use serde::Serialize;

use crate::entities::log_entry::LogEntryResponse;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub projects: u64,
    pub categories: u64,
    pub enabled_categories: u64,
    pub experiences: u64,
    /// Keyed by category kind; kinds without projects report zero.
    pub projects_by_category: BTreeMap<String, u64>,
    pub recent_errors: Vec<LogEntryResponse>,
    pub logs_last_24h: u64,
    pub basic_info_complete: bool,
}

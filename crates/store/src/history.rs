//! Publish history view: filtering, summary stats and CSV export.

use chrono::NaiveDate;
use creative_core::{HistoryRecord, HistoryStatus};
use serde::Serialize;

pub const CSV_HEADER: &str = "Job ID,Campaign,Platform,Status,Creatives Count,Date";

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub game_id: Option<String>,
    pub search: String,
    pub status: Option<HistoryStatus>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &HistoryRecord) -> bool {
        // Records written before games were tracked belong to every game.
        let game_ok = match (&self.game_id, &record.game_id) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        };
        let needle = self.search.to_lowercase();
        let search_ok = record.id.to_string().to_lowercase().contains(&needle)
            || record.campaign.to_lowercase().contains(&needle);
        let status_ok = self.status.map_or(true, |s| record.status == s);
        game_ok && search_ok && status_ok
    }

    pub fn apply(&self, records: &[HistoryRecord]) -> Vec<HistoryRecord> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    /// Rounded percentage of `Success` records among `total`.
    pub success_rate: u32,
    pub last_activity: Option<NaiveDate>,
}

impl HistoryStats {
    /// Stats over `filtered`; last activity is the newest record overall.
    pub fn compute(filtered: &[HistoryRecord], all: &[HistoryRecord]) -> Self {
        let total = filtered.len();
        let successes = filtered
            .iter()
            .filter(|r| r.status == HistoryStatus::Success)
            .count();
        let success_rate = if total == 0 {
            0
        } else {
            (successes as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            total,
            success_rate,
            last_activity: all.first().map(|r| r.date),
        }
    }
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// CSV for `records`, or `None` when there is nothing to export.
pub fn export_csv(records: &[HistoryRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for record in records {
        let cells = [
            record.id.to_string(),
            quoted(&record.campaign),
            record.platform.to_string(),
            record.status.to_string(),
            record.creatives.to_string(),
            quoted(&record.date.format("%Y-%m-%d").to_string()),
        ];
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    Some(csv)
}

pub fn export_file_name(game_name: &str, today: NaiveDate) -> String {
    format!(
        "publish_history_{}_{}.csv",
        game_name.replace(' ', "_"),
        today.format("%Y-%m-%d")
    )
}

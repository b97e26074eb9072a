//! JSON export of a monitoring session.

use crate::analytics::Analytics;
use crate::config::{ScanSettings, VenueConfig};
use crate::errors::Result;
use crate::models::Opportunity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub total_viable: usize,
    pub avg_profit_viable: f64,
    pub best_opportunity: Option<Opportunity>,
    /// Source calls made across all venues during the session.
    pub api_calls_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub opportunities: Vec<Opportunity>,
    pub analytics: Analytics,
    pub settings: ScanSettings,
    pub venues: Vec<VenueConfig>,
    pub timestamp: DateTime<Utc>,
    pub summary: ExportSummary,
}

impl ExportReport {
    pub fn new(
        opportunities: Vec<Opportunity>,
        analytics: Analytics,
        settings: ScanSettings,
        venues: Vec<VenueConfig>,
        api_calls_total: u64,
    ) -> Self {
        let summary = summarize(&opportunities, api_calls_total);
        Self {
            opportunities,
            analytics,
            settings,
            venues,
            timestamp: Utc::now(),
            summary,
        }
    }

    /// Write pretty JSON. A directory target gets a dated file name.
    pub fn write_to(&self, target: &Path) -> Result<PathBuf> {
        let path = if target.is_dir() {
            target.join(default_file_name(self.timestamp))
        } else {
            target.to_path_buf()
        };
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        info!(path = %path.display(), count = self.opportunities.len(), "[EXPORT] session written");
        Ok(path)
    }
}

pub fn default_file_name(at: DateTime<Utc>) -> String {
    format!("triangular-arbitrage-{}.json", at.format("%Y-%m-%d"))
}

fn summarize(opportunities: &[Opportunity], api_calls_total: u64) -> ExportSummary {
    let viable: Vec<&Opportunity> = opportunities.iter().filter(|o| o.is_viable()).collect();
    let avg_profit_viable = if viable.is_empty() {
        0.0
    } else {
        viable.iter().map(|o| o.net_profit_percent()).sum::<f64>() / viable.len() as f64
    };
    // First entry wins ties.
    let best_opportunity = opportunities
        .iter()
        .fold(None::<&Opportunity>, |best, cur| match best {
            Some(b) if cur.net_profit_percent() <= b.net_profit_percent() => Some(b),
            _ => Some(cur),
        })
        .cloned();
    ExportSummary {
        total_viable: viable.len(),
        avg_profit_viable,
        best_opportunity,
        api_calls_total,
    }
}

//! Opportunity history and aggregate statistics.

use crate::config::MAX_HISTORY_CAPACITY;
use crate::models::Opportunity;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

pub const TOP_PAIRS_LIMIT: usize = 8;
pub const TOP_VENUES_LIMIT: usize = 10;

/// Newest-first history capped at a fixed number of entries.
#[derive(Debug, Clone, Default)]
pub struct OpportunityLog {
    entries: VecDeque<Opportunity>,
    capacity: usize,
}

impl OpportunityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(MAX_HISTORY_CAPACITY)),
            capacity,
        }
    }

    /// Prepend a pass's results, keeping their order, and drop the oldest overflow.
    pub fn record(&mut self, batch: &[Opportunity]) {
        for opp in batch.iter().rev() {
            self.entries.push_front(opp.clone());
        }
        self.entries.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Opportunity> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Opportunity> {
        self.entries.iter().cloned().collect()
    }

    pub fn viable_count(&self) -> usize {
        self.entries.iter().filter(|o| o.is_viable()).count()
    }

    /// Share of retained opportunities that were viable, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.viable_count() as f64 / self.entries.len() as f64 * 100.0
    }

    /// Highest net profit among retained opportunities, 0 when empty.
    pub fn best_profit(&self) -> f64 {
        self.entries
            .iter()
            .map(Opportunity::net_profit_percent)
            .fold(None, |best: Option<f64>, p| Some(best.map_or(p, |b| b.max(p))))
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairStats {
    pub pair: String,
    pub count: usize,
    pub avg_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueStats {
    pub venue: String,
    pub count: usize,
    pub avg_profit: f64,
}

/// Running totals plus a breakdown of the latest pass's viable opportunities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    pub total_opportunities: usize,
    pub average_profit: f64,
    pub top_pairs: Vec<PairStats>,
    pub top_venues: Vec<VenueStats>,
    pub total_volume: f64,
}

impl Analytics {
    /// Fold one pass into the totals. An empty pass changes nothing.
    pub fn update(&mut self, pass: &[Opportunity]) {
        if pass.is_empty() {
            return;
        }
        let viable: Vec<&Opportunity> = pass.iter().filter(|o| o.is_viable()).collect();

        self.total_opportunities += pass.len();
        self.average_profit = if viable.is_empty() {
            0.0
        } else {
            viable.iter().map(|o| o.net_profit_percent()).sum::<f64>() / viable.len() as f64
        };
        self.top_pairs = top_groups(&viable, |o| o.result.assets.to_string(), TOP_PAIRS_LIMIT)
            .into_iter()
            .map(|(pair, count, avg_profit)| PairStats {
                pair,
                count,
                avg_profit,
            })
            .collect();
        self.top_venues = top_groups(&viable, |o| o.venue.clone(), TOP_VENUES_LIMIT)
            .into_iter()
            .map(|(venue, count, avg_profit)| VenueStats {
                venue,
                count,
                avg_profit,
            })
            .collect();
        self.total_volume += pass
            .iter()
            .map(|o| o.result.min_liquidity_across_legs)
            .sum::<f64>();
    }
}

/// Group by key, sort by count descending (ties by key), keep `limit`.
fn top_groups<F>(opps: &[&Opportunity], key: F, limit: usize) -> Vec<(String, usize, f64)>
where
    F: Fn(&Opportunity) -> String,
{
    let mut groups: HashMap<String, (usize, f64)> = HashMap::new();
    for opp in opps {
        let entry = groups.entry(key(opp)).or_default();
        entry.0 += 1;
        entry.1 += opp.net_profit_percent();
    }
    let mut ranked: Vec<(String, usize, f64)> = groups
        .into_iter()
        .map(|(k, (count, total))| (k, count, total / count as f64))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

//! Polling loop that turns venue quotes into evaluated opportunities.

use crate::{
    analytics::{Analytics, OpportunityLog},
    arbitrage::{EvaluationParams, TriangleRates, evaluate_triangle},
    config::{ScanSettings, VenueConfig},
    errors::{AppError, Result},
    feeds::VenueFeed,
    models::{ConnectionStatus, LegLiquidity, Opportunity, Triangle},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Everything a consumer needs to render the current state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSnapshot {
    pub opportunities: Vec<Opportunity>,
    pub analytics: Analytics,
    pub statuses: BTreeMap<String, ConnectionStatus>,
    pub api_calls: BTreeMap<String, u64>,
    pub api_calls_total: u64,
    pub last_update: Option<DateTime<Utc>>,
    pub passes: u64,
    pub success_rate: f64,
    pub best_profit: f64,
}

/// Owns the history and analytics; feeds are shared.
pub struct Scanner {
    feeds: Vec<VenueFeed>,
    settings: ScanSettings,
    statuses: BTreeMap<String, ConnectionStatus>,
    history: OpportunityLog,
    analytics: Analytics,
    next_id: u64,
    passes: u64,
    last_update: Option<DateTime<Utc>>,
}

struct VenueOutcome {
    venue_id: String,
    status: ConnectionStatus,
    opportunities: Vec<Opportunity>,
}

impl Scanner {
    pub fn new(feeds: Vec<VenueFeed>, settings: ScanSettings) -> Self {
        let statuses = feeds
            .iter()
            .map(|f| (f.venue.id.clone(), ConnectionStatus::Offline))
            .collect();
        let history = OpportunityLog::new(settings.history_capacity);
        Self {
            feeds,
            settings,
            statuses,
            history,
            analytics: Analytics::default(),
            next_id: 1,
            passes: 0,
            last_update: None,
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn venues(&self) -> Vec<VenueConfig> {
        self.feeds.iter().map(|f| f.venue.clone()).collect()
    }

    pub fn history(&self) -> &OpportunityLog {
        &self.history
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn status(&self, venue_id: &str) -> ConnectionStatus {
        self.statuses.get(venue_id).copied().unwrap_or_default()
    }

    /// Source calls per venue since start.
    pub fn api_calls(&self) -> BTreeMap<String, u64> {
        self.feeds
            .iter()
            .map(|f| (f.venue.id.clone(), f.api_calls()))
            .collect()
    }

    pub fn api_calls_total(&self) -> u64 {
        self.feeds.iter().map(VenueFeed::api_calls).sum()
    }

    /// Scan every venue once. Venues run concurrently; results are returned
    /// in venue order and also folded into history and analytics.
    pub async fn scan_once(&mut self) -> Vec<Opportunity> {
        self.last_update = Some(Utc::now());
        for status in self.statuses.values_mut() {
            if *status != ConnectionStatus::Connected {
                *status = ConnectionStatus::Connecting;
            }
        }
        let settings = &self.settings;
        let statuses = &self.statuses;

        let outcomes = join_all(self.feeds.iter().map(|feed| {
            let status = statuses.get(&feed.venue.id).copied().unwrap_or_default();
            scan_venue(feed, status, settings)
        }))
        .await;

        let mut pass = Vec::new();
        for outcome in outcomes {
            self.statuses.insert(outcome.venue_id, outcome.status);
            for mut opp in outcome.opportunities {
                opp.id = self.next_id;
                self.next_id += 1;
                pass.push(opp);
            }
        }

        self.passes += 1;
        self.history.record(&pass);
        self.analytics.update(&pass);

        let viable = pass.iter().filter(|o| o.is_viable()).count();
        info!(
            pass = self.passes,
            found = pass.len(),
            viable,
            "[SCAN] pass complete"
        );
        for opp in pass.iter().filter(|o| o.is_viable()) {
            info!(
                venue = %opp.venue,
                route = %opp.route,
                net_profit_percent = opp.result.net_profit_percent,
                min_liquidity = opp.result.min_liquidity_across_legs,
                "[OPP] viable opportunity"
            );
        }
        pass
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            opportunities: self.history.to_vec(),
            analytics: self.analytics.clone(),
            statuses: self.statuses.clone(),
            api_calls: self.api_calls(),
            api_calls_total: self.api_calls_total(),
            last_update: self.last_update,
            passes: self.passes,
            success_rate: self.history.success_rate(),
            best_profit: self.history.best_profit(),
        }
    }

    /// Scan on every tick until `shutdown` flips to true, publishing a
    /// snapshot after each pass. Returns the scanner so callers can export.
    pub async fn run(
        mut self,
        snapshot_tx: watch::Sender<ScanSnapshot>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Self {
        let mut ticker = tokio::time::interval(self.settings.update_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            venues = self.feeds.len(),
            interval_ms = self.settings.update_interval_ms,
            "[INIT] scanner started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }
            if *shutdown.borrow() {
                break;
            }

            let pass = self.scan_once().await;
            if pass.is_empty() && self.passes % 5 == 0 {
                info!(statuses = ?self.statuses, "[HEARTBEAT] no quotes evaluated");
            }
            let _ = snapshot_tx.send(self.snapshot());
        }

        info!(passes = self.passes, "[SHUTDOWN] scanner stopped");
        self
    }
}

/// Spawn [`Scanner::run`] on the runtime.
pub fn spawn_scanner(
    scanner: Scanner,
    snapshot_tx: watch::Sender<ScanSnapshot>,
    shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<Scanner> {
    tokio::spawn(scanner.run(snapshot_tx, shutdown))
}

async fn scan_venue(
    feed: &VenueFeed,
    current: ConnectionStatus,
    settings: &ScanSettings,
) -> VenueOutcome {
    let venue_id = feed.venue.id.clone();

    if current != ConnectionStatus::Connected {
        debug!(venue = %venue_id, "[SCAN] connecting");
        if let Err(e) = feed.probe().await {
            let status = status_for(&e);
            warn!(venue = %venue_id, error = %e, "[SCAN] venue unreachable");
            return VenueOutcome {
                venue_id,
                status,
                opportunities: Vec::new(),
            };
        }
        info!(venue = %venue_id, "[SCAN] connected");
    }

    let mut status = ConnectionStatus::Connected;
    let mut opportunities = Vec::new();
    let batch_size = settings.batch_size.max(1);
    let batches: Vec<&[Triangle]> = feed.venue.triangles.chunks(batch_size).collect();

    for (i, batch) in batches.iter().enumerate() {
        let results = join_all(batch.iter().map(|t| evaluate_on_venue(feed, t, settings))).await;
        for (triangle, res) in batch.iter().zip(results) {
            match res {
                Ok(Some(opp)) => opportunities.push(opp),
                Ok(None) => debug!(venue = %venue_id, %triangle, "[SCAN] rejected quotes"),
                Err(e) => {
                    if matches!(e, AppError::RateLimited(_)) {
                        status = ConnectionStatus::RateLimited;
                    }
                    warn!(venue = %venue_id, %triangle, error = %e, "[SCAN] quote failed");
                }
            }
        }
        if i + 1 < batches.len() && !settings.batch_delay().is_zero() {
            tokio::time::sleep(settings.batch_delay()).await;
        }
    }

    debug!(venue = %venue_id, found = opportunities.len(), "[SCAN] venue done");
    VenueOutcome {
        venue_id,
        status,
        opportunities,
    }
}

/// Fetch the three legs, evaluate, and stamp the result. The id is assigned later.
async fn evaluate_on_venue(
    feed: &VenueFeed,
    triangle: &Triangle,
    settings: &ScanSettings,
) -> Result<Option<Opportunity>> {
    let (ac, bc, ab) = futures::try_join!(
        feed.quote(&triangle.a, &triangle.c),
        feed.quote(&triangle.b, &triangle.c),
        feed.quote(&triangle.a, &triangle.b),
    )?;

    let gas_estimate = feed.venue.gas.sample(&mut rand::rng());
    let params = EvaluationParams {
        fee_percent: feed.venue.fee_percent,
        starting_notional: settings.starting_notional,
        gas_estimate,
        min_profit_percent: settings.min_profit_percent,
        min_liquidity: settings.min_liquidity,
        leg_liquidity: [ac.liquidity, bc.liquidity, ab.liquidity],
    };
    let rates = TriangleRates {
        a_to_c: ac.rate,
        b_to_c: bc.rate,
        a_to_b: ab.rate,
    };

    Ok(evaluate_triangle(triangle, rates, &params).map(|result| Opportunity {
        id: 0,
        venue: feed.venue.id.clone(),
        chain: feed.venue.chain.clone(),
        route: result.best_cycle_direction.route(triangle),
        timestamp: Utc::now(),
        rates,
        liquidity: LegLiquidity {
            a_to_c: ac.liquidity,
            b_to_c: bc.liquidity,
            a_to_b: ab.liquidity,
        },
        result,
    }))
}

fn status_for(err: &AppError) -> ConnectionStatus {
    match err {
        AppError::RateLimited(_) => ConnectionStatus::RateLimited,
        _ => ConnectionStatus::Error,
    }
}

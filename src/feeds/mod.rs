//! Price feeds.
//!
//! Responsibilities:
//! • Produce a fresh [`Quote`] for a base/quote pair on demand.
//! • Report reachability so the scanner can track connection status.
//!
//! Randomness used to fake market data lives here and never in the
//! arbitrage math.

use crate::config::{AppConfig, PriceSourceKind, VenueConfig};
use crate::errors::Result;
use crate::models::Quote;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod coingecko;
pub mod simulated;

pub use coingecko::CoinGeckoSource;
pub use simulated::SimulatedSource;

#[async_trait]
pub trait PriceSource: Send + Sync {
    fn id(&self) -> &str;

    /// Cheap connectivity check made before a venue is first scanned.
    async fn probe(&self) -> Result<()>;

    /// Units of `quote` per unit of `base`.
    async fn quote(&self, base: &str, quote: &str) -> Result<Quote>;
}

/// A venue paired with the feed that prices it.
///
/// Every `probe` and `quote` made through the feed is counted, failed calls included.
#[derive(Clone)]
pub struct VenueFeed {
    pub venue: VenueConfig,
    pub source: Arc<dyn PriceSource>,
    calls: Arc<AtomicU64>,
}

impl VenueFeed {
    pub fn new(venue: VenueConfig, source: Arc<dyn PriceSource>) -> Self {
        Self {
            venue,
            source,
            calls: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn probe(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.source.probe().await
    }

    pub async fn quote(&self, base: &str, quote: &str) -> Result<Quote> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.source.quote(base, quote).await
    }

    /// Source calls made so far.
    pub fn api_calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

/// Build one feed per venue according to the configured source kind.
pub fn build_feeds(cfg: &AppConfig) -> Result<Vec<VenueFeed>> {
    cfg.venues
        .iter()
        .map(|venue| {
            let source: Arc<dyn PriceSource> = match cfg.price_source {
                PriceSourceKind::Simulated => Arc::new(SimulatedSource::for_venue(venue)),
                PriceSourceKind::CoinGecko => {
                    Arc::new(CoinGeckoSource::new(&venue.id, &cfg.coingecko_api)?)
                }
            };
            Ok(VenueFeed::new(venue.clone(), source))
        })
        .collect()
}

use super::PriceSource;
use crate::errors::{AppError, Result};
use crate::models::Quote;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// The endpoint reports no depth, so quotes carry these fixed figures.
const FALLBACK_LIQUIDITY: f64 = 2000.0;
const FALLBACK_VOLUME_24H: f64 = 5000.0;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// `{ "<coin id>": { "usd": price } }`
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

/// HTTP feed backed by CoinGecko's `simple/price` endpoint.
///
/// Both legs are priced in USD and divided, so any two listed coins form a pair.
pub struct CoinGeckoSource {
    id: String,
    base_url: Url,
    client: Client,
}

impl CoinGeckoSource {
    pub fn new(id: &str, base_url: &str) -> Result<Self> {
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            id: id.to_string(),
            base_url: Url::parse(&normalized)?,
            client,
        })
    }

    fn simple_price_url(&self, ids: &[&str]) -> Result<Url> {
        let mut url = self.base_url.join("simple/price")?;
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("vs_currencies", "usd");
        Ok(url)
    }

    fn check_status(&self, status: StatusCode) -> Result<()> {
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited(self.id.clone()));
        }
        if !status.is_success() {
            return Err(AppError::feed(&self.id, format!("HTTP {status}")));
        }
        Ok(())
    }
}

/// Map a ticker to a CoinGecko coin id. Unlisted tickers are lowercased as-is.
pub fn coin_id(symbol: &str) -> String {
    let id = match symbol.to_uppercase().as_str() {
        "AVAX" | "WAVAX" => "avalanche-2",
        "JOE" => "joe",
        "SOL" => "solana",
        "RAY" => "raydium",
        "USDC" | "USDC.E" => "usd-coin",
        "USDT" => "tether",
        "DAI" => "dai",
        "FRAX" => "frax",
        "OP" => "optimism",
        "VELO" => "velodrome-finance",
        "SNX" => "havven",
        "ARB" => "arbitrum",
        "GMX" => "gmx",
        "ATOM" => "cosmos",
        "OSMO" => "osmosis",
        "FTM" => "fantom",
        "BNB" => "binancecoin",
        "CAKE" => "pancakeswap-token",
        _ => return symbol.to_lowercase(),
    };
    id.to_string()
}

/// Divide the USD prices of two coins out of a `simple/price` body.
pub fn rate_from_response(
    source_id: &str,
    body: &SimplePriceResponse,
    base_id: &str,
    quote_id: &str,
) -> Result<f64> {
    let usd = |coin: &str| {
        body.get(coin)
            .and_then(|m| m.get("usd"))
            .copied()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| AppError::feed(source_id, format!("no usd price for {coin}")))
    };
    Ok(usd(base_id)? / usd(quote_id)?)
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn probe(&self) -> Result<()> {
        let url = self.base_url.join("ping")?;
        let resp = self.client.get(url).send().await?;
        self.check_status(resp.status())
    }

    async fn quote(&self, base: &str, quote: &str) -> Result<Quote> {
        let (base_id, quote_id) = (coin_id(base), coin_id(quote));
        let url = self.simple_price_url(&[base_id.as_str(), quote_id.as_str()])?;
        debug!(%url, source = %self.id, "[FEED] requesting price");

        let resp = self.client.get(url).send().await?;
        self.check_status(resp.status())?;
        let body: SimplePriceResponse = resp.json().await?;
        let rate = rate_from_response(&self.id, &body, &base_id, &quote_id)?;

        Ok(Quote {
            base: base.to_string(),
            quote: quote.to_string(),
            rate,
            liquidity: FALLBACK_LIQUIDITY,
            volume_24h: FALLBACK_VOLUME_24H,
            source: format!("{}-coingecko", self.id),
        })
    }
}

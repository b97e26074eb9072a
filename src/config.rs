//! Configuration loader and application settings.

use crate::errors::{AppError, Result};
use crate::models::Triangle;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_COINGECKO_API: &str = "https://api.coingecko.com/api/v3";

/// Upper bound for `HISTORY_CAPACITY`.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Estimated gas cost of one full cycle on a chain, in units of the start asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GasProfile {
    Constant { cost: f64 },
    Uniform { min: f64, max: f64 },
}

impl GasProfile {
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Constant { cost } => cost,
            Self::Uniform { min, max } if max > min => rng.random_range(min..max),
            Self::Uniform { min, .. } => min,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match *self {
            Self::Constant { cost } if !(cost.is_finite() && cost >= 0.0) => {
                Err(format!("constant gas cost {cost} must be finite and non-negative"))
            }
            Self::Uniform { min, max }
                if !(min.is_finite() && max.is_finite() && min >= 0.0 && max >= min) =>
            {
                Err(format!("uniform gas range [{min}, {max}) is invalid"))
            }
            _ => Ok(()),
        }
    }
}

/// Venue-specific values. One entry per venue instead of one code path per venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueConfig {
    pub id: String,
    pub name: String,
    pub chain: String,
    /// Fee charged on every leg, in percent.
    pub fee_percent: f64,
    pub gas: GasProfile,
    /// Typical pool depth, used by the simulated feed.
    pub min_liquidity: f64,
    pub triangles: Vec<Triangle>,
}

impl VenueConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.fee_percent.is_finite() && (0.0..100.0).contains(&self.fee_percent)) {
            return Err(AppError::Config(format!(
                "venue {}: fee_percent {} outside [0, 100)",
                self.id, self.fee_percent
            )));
        }
        self.gas
            .validate()
            .map_err(|e| AppError::Config(format!("venue {}: {e}", self.id)))
    }
}

/// Which price feed backs the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSourceKind {
    Simulated,
    CoinGecko,
}

impl FromStr for PriceSourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "simulated" => Ok(Self::Simulated),
            "coingecko" => Ok(Self::CoinGecko),
            other => Err(AppError::Config(format!("unknown PRICE_SOURCE '{other}'"))),
        }
    }
}

/// Knobs for the polling loop and the viability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub min_profit_percent: f64,
    pub min_liquidity: f64,
    pub update_interval_ms: u64,
    pub starting_notional: f64,
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub history_capacity: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            min_profit_percent: 0.15,
            min_liquidity: 2500.0,
            update_interval_ms: 6000,
            starting_notional: 1000.0,
            batch_size: 3,
            batch_delay_ms: 1000,
            history_capacity: 120,
        }
    }
}

impl ScanSettings {
    /// Never zero; a tokio interval cannot tick with a zero period.
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms.max(1))
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: ScanSettings,
    pub price_source: PriceSourceKind,
    pub coingecko_api: String,
    pub venues: Vec<VenueConfig>,
    pub export_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup; `load` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ScanSettings::default();
        let settings = ScanSettings {
            min_profit_percent: parse_or(&lookup, "MIN_PROFIT_THRESHOLD", defaults.min_profit_percent)?,
            min_liquidity: parse_or(&lookup, "MIN_LIQUIDITY", defaults.min_liquidity)?,
            update_interval_ms: parse_or(&lookup, "UPDATE_INTERVAL_MS", defaults.update_interval_ms)?,
            starting_notional: parse_or(&lookup, "STARTING_NOTIONAL", defaults.starting_notional)?,
            batch_size: parse_or(&lookup, "BATCH_SIZE", defaults.batch_size)?.max(1),
            batch_delay_ms: parse_or(&lookup, "BATCH_DELAY_MS", defaults.batch_delay_ms)?,
            history_capacity: parse_or(&lookup, "HISTORY_CAPACITY", defaults.history_capacity)?,
        };
        if !(settings.starting_notional.is_finite() && settings.starting_notional > 0.0) {
            return Err(AppError::Config(
                "STARTING_NOTIONAL must be a positive number".into(),
            ));
        }
        if settings.update_interval_ms == 0 {
            return Err(AppError::Config(
                "UPDATE_INTERVAL_MS must be greater than zero".into(),
            ));
        }
        if !(1..=MAX_HISTORY_CAPACITY).contains(&settings.history_capacity) {
            return Err(AppError::Config(format!(
                "HISTORY_CAPACITY must be between 1 and {MAX_HISTORY_CAPACITY}"
            )));
        }

        let price_source = match lookup("PRICE_SOURCE") {
            Some(raw) => raw.parse()?,
            None => PriceSourceKind::Simulated,
        };
        let coingecko_api =
            lookup("COINGECKO_API").unwrap_or_else(|| DEFAULT_COINGECKO_API.to_string());

        let mut venues = match lookup("VENUES_FILE") {
            Some(path) => load_venues_file(&path)?,
            None => builtin_venues(),
        };
        if let Some(enabled) = lookup("ENABLED_VENUES") {
            venues = filter_venues(venues, &enabled)?;
        }
        for venue in &venues {
            venue.validate()?;
        }

        Ok(Self {
            settings,
            price_source,
            coingecko_api,
            venues,
            export_path: lookup("EXPORT_PATH").map(PathBuf::from),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has invalid value '{raw}'"))),
        None => Ok(default),
    }
}

/// Read a JSON array of venues.
pub fn load_venues_file(path: &str) -> Result<Vec<VenueConfig>> {
    let raw = std::fs::read_to_string(path)?;
    let venues: Vec<VenueConfig> = serde_json::from_str(&raw)?;
    Ok(venues)
}

/// Keep only the venues named in a comma-separated id list.
pub fn filter_venues(venues: Vec<VenueConfig>, enabled: &str) -> Result<Vec<VenueConfig>> {
    let wanted: Vec<&str> = enabled
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if let Some(unknown) = wanted
        .iter()
        .find(|id| !venues.iter().any(|v| v.id == **id))
    {
        return Err(AppError::Config(format!("ENABLED_VENUES names unknown venue '{unknown}'")));
    }
    Ok(venues
        .into_iter()
        .filter(|v| wanted.contains(&v.id.as_str()))
        .collect())
}

/// Venues scanned when no `VENUES_FILE` is given.
pub fn builtin_venues() -> Vec<VenueConfig> {
    vec![
        VenueConfig {
            id: "traderjoe".into(),
            name: "Trader Joe".into(),
            chain: "Avalanche".into(),
            fee_percent: 0.3,
            gas: GasProfile::Uniform { min: 0.1, max: 0.6 },
            min_liquidity: 2500.0,
            triangles: triangles(&[
                ("AVAX", "JOE", "USDC.e"),
                ("AVAX", "USDT", "USDC.e"),
                ("JOE", "AVAX", "USDC.e"),
                ("AVAX", "USDC.e", "WAVAX"),
            ]),
        },
        VenueConfig {
            id: "raydium".into(),
            name: "Raydium".into(),
            chain: "Solana".into(),
            fee_percent: 0.25,
            gas: GasProfile::Uniform {
                min: 0.01,
                max: 0.06,
            },
            min_liquidity: 2000.0,
            triangles: triangles(&[
                ("SOL", "RAY", "USDC"),
                ("RAY", "USDC", "SOL"),
                ("SOL", "USDT", "USDC"),
                ("RAY", "SOL", "USDC"),
            ]),
        },
    ]
}

fn triangles(list: &[(&str, &str, &str)]) -> Vec<Triangle> {
    list.iter().map(|(a, b, c)| Triangle::new(a, b, c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).expect("defaults load");
        assert_eq!(cfg.settings, ScanSettings::default());
        assert_eq!(cfg.price_source, PriceSourceKind::Simulated);
        assert_eq!(cfg.coingecko_api, DEFAULT_COINGECKO_API);
        assert_eq!(cfg.venues.len(), 2);
        assert!(cfg.export_path.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("MIN_PROFIT_THRESHOLD", "0.08"),
            ("MIN_LIQUIDITY", "1500"),
            ("BATCH_SIZE", "0"),
            ("PRICE_SOURCE", "CoinGecko"),
            ("ENABLED_VENUES", "raydium"),
            ("EXPORT_PATH", "/tmp/out.json"),
        ]))
        .expect("valid overrides");
        assert_eq!(cfg.settings.min_profit_percent, 0.08);
        assert_eq!(cfg.settings.min_liquidity, 1500.0);
        assert_eq!(cfg.settings.batch_size, 1);
        assert_eq!(cfg.price_source, PriceSourceKind::CoinGecko);
        assert_eq!(cfg.venues.len(), 1);
        assert_eq!(cfg.venues[0].id, "raydium");
        assert_eq!(cfg.export_path, Some(PathBuf::from("/tmp/out.json")));
    }

    #[test]
    fn malformed_number_is_a_config_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("MIN_LIQUIDITY", "lots")]))
            .expect_err("should reject");
        assert!(matches!(err, AppError::Config(msg) if msg.contains("MIN_LIQUIDITY")));
    }

    #[test]
    fn zero_update_interval_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("UPDATE_INTERVAL_MS", "0")]))
            .expect_err("zero period");
        assert!(matches!(err, AppError::Config(msg) if msg.contains("UPDATE_INTERVAL_MS")));
    }

    #[test]
    fn history_capacity_is_bounded() {
        let huge = usize::MAX.to_string();
        for raw in ["0", huge.as_str()] {
            let err = AppConfig::from_lookup(lookup_from(&[("HISTORY_CAPACITY", raw)]))
                .expect_err("out of range");
            assert!(matches!(err, AppError::Config(msg) if msg.contains("HISTORY_CAPACITY")));
        }
        let max = MAX_HISTORY_CAPACITY.to_string();
        let cfg = AppConfig::from_lookup(lookup_from(&[("HISTORY_CAPACITY", max.as_str())]))
            .expect("upper bound is allowed");
        assert_eq!(cfg.settings.history_capacity, MAX_HISTORY_CAPACITY);
    }

    #[test]
    fn unknown_venue_is_rejected() {
        let err = filter_venues(builtin_venues(), "raydium, uniswap").expect_err("unknown id");
        assert!(err.to_string().contains("uniswap"));
    }

    #[test]
    fn venue_fee_must_be_below_one_hundred() {
        let mut venue = builtin_venues().remove(0);
        venue.fee_percent = 100.0;
        assert!(venue.validate().is_err());
        venue.fee_percent = 0.0;
        assert!(venue.validate().is_ok());
    }

    #[test]
    fn gas_samples_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let profile = GasProfile::Uniform { min: 0.1, max: 0.6 };
        for _ in 0..1000 {
            let g = profile.sample(&mut rng);
            assert!((0.1..0.6).contains(&g));
        }
        assert_eq!(GasProfile::Constant { cost: 0.5 }.sample(&mut rng), 0.5);
        assert_eq!(GasProfile::Uniform { min: 0.2, max: 0.2 }.sample(&mut rng), 0.2);
    }

    #[test]
    fn venue_roundtrips_through_json_file_format() {
        let raw = r#"[{
            "id": "velodrome",
            "name": "Velodrome",
            "chain": "Optimism",
            "fee_percent": 0.05,
            "gas": { "kind": "uniform", "min": 0.3, "max": 1.8 },
            "min_liquidity": 2500,
            "triangles": ["OP-VELO-USDC", "OP-SNX-USDC"]
        }]"#;
        let venues: Vec<VenueConfig> = serde_json::from_str(raw).expect("valid venue json");
        assert_eq!(venues[0].triangles[1], Triangle::new("OP", "SNX", "USDC"));
        assert!(venues[0].validate().is_ok());
    }
}

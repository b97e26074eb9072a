//! Shared data structures used throughout the application.

use crate::arbitrage::{ArbitrageResult, TriangleRates};
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spot quote for one asset pair on a venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub base: String,
    pub quote: String,
    /// Units of `quote` obtainable per unit of `base`.
    pub rate: f64,
    pub liquidity: f64,
    pub volume_24h: f64,
    pub source: String,
}

/// Ordered asset triple. `c` is the asset a cycle starts and ends in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Triangle {
    pub a: String,
    pub b: String,
    pub c: String,
}

impl Triangle {
    pub fn new(a: &str, b: &str, c: &str) -> Self {
        Self {
            a: a.to_string(),
            b: b.to_string(),
            c: c.to_string(),
        }
    }
}

impl fmt::Display for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.a, self.b, self.c)
    }
}

impl FromStr for Triangle {
    type Err = AppError;

    /// Parses the dashed form, e.g. `AVAX-JOE-USDC.e`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('-').map(str::trim).collect();
        match parts.as_slice() {
            [a, b, c] if !a.is_empty() && !b.is_empty() && !c.is_empty() => {
                Ok(Self::new(a, b, c))
            }
            _ => Err(AppError::Config(format!(
                "triangle '{s}' must have exactly three dash-separated assets"
            ))),
        }
    }
}

impl TryFrom<String> for Triangle {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Triangle> for String {
    fn from(t: Triangle) -> Self {
        t.to_string()
    }
}

/// Per-venue connectivity as observed by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Offline,
    Connecting,
    Connected,
    Error,
    RateLimited,
}

/// Available depth for each leg, in the same order as [`TriangleRates`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegLiquidity {
    pub a_to_c: f64,
    pub b_to_c: f64,
    pub a_to_b: f64,
}

/// An evaluation result stamped with where and when it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: u64,
    pub venue: String,
    pub chain: String,
    pub route: String,
    pub timestamp: DateTime<Utc>,
    /// Rates the evaluation was run against.
    pub rates: TriangleRates,
    pub liquidity: LegLiquidity,
    pub result: ArbitrageResult,
}

impl Opportunity {
    pub fn net_profit_percent(&self) -> f64 {
        self.result.net_profit_percent
    }

    pub fn is_viable(&self) -> bool {
        self.result.viable
    }
}

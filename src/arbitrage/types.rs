use crate::models::Triangle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Net profit percentages at or beyond this magnitude are treated as corrupt input.
pub const SANITY_CEILING_PERCENT: f64 = 150.0;

/// Notional used when the caller supplies a non-positive or non-finite one.
pub const DEFAULT_STARTING_NOTIONAL: f64 = 1000.0;

/// Three quoted rates from a single venue for the triangle `(A, B, C)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangleRates {
    /// Units of C per unit of A.
    pub a_to_c: f64,
    /// Units of C per unit of B.
    pub b_to_c: f64,
    /// Units of B per unit of A.
    pub a_to_b: f64,
}

/// Per-evaluation costs and viability cutoffs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationParams {
    /// Fee applied to each of the three legs, in percent.
    pub fee_percent: f64,
    /// Amount of C committed; only used to express gas as a percentage.
    pub starting_notional: f64,
    /// Gas cost in units of C.
    pub gas_estimate: f64,
    pub min_profit_percent: f64,
    pub min_liquidity: f64,
    /// Depth for the A/C, B/C and A/B quotes respectively.
    pub leg_liquidity: [f64; 3],
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            fee_percent: 0.0,
            starting_notional: DEFAULT_STARTING_NOTIONAL,
            gas_estimate: 0.0,
            min_profit_percent: 0.0,
            min_liquidity: 0.0,
            leg_liquidity: [0.0; 3],
        }
    }
}

/// Which of the two Hamiltonian cycles on three assets was more profitable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleDirection {
    /// A→B→C→A, executed from C as C→A→B→C.
    Forward,
    /// A→C→B→A, executed from C as C→B→A→C.
    Reverse,
}

impl CycleDirection {
    /// Human readable route starting and ending in C.
    pub fn route(&self, t: &Triangle) -> String {
        match self {
            Self::Forward => format!("{} → {} → {} → {}", t.c, t.a, t.b, t.c),
            Self::Reverse => format!("{} → {} → {} → {}", t.c, t.b, t.a, t.c),
        }
    }
}

impl fmt::Display for CycleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "A→B→C→A"),
            Self::Reverse => write!(f, "A→C→B→A"),
        }
    }
}

/// Outcome of one triangular evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageResult {
    pub assets: Triangle,
    pub best_cycle_direction: CycleDirection,
    pub gross_profit_percent: f64,
    pub net_profit_percent: f64,
    pub fees_total_percent: f64,
    pub gas_estimate: f64,
    pub min_liquidity_across_legs: f64,
    pub cross_rate_inefficiency_percent: f64,
    pub viable: bool,
}

pub mod evaluator;
pub mod types;

pub use evaluator::{cross_rate_inefficiency_percent, evaluate_triangle};
pub use types::{
    ArbitrageResult, CycleDirection, DEFAULT_STARTING_NOTIONAL, EvaluationParams,
    SANITY_CEILING_PERCENT, TriangleRates,
};

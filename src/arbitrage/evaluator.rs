use super::types::{
    ArbitrageResult, CycleDirection, DEFAULT_STARTING_NOTIONAL, EvaluationParams,
    SANITY_CEILING_PERCENT, TriangleRates,
};
use crate::models::Triangle;

/// Evaluate both trade cycles of a triangle and keep the better one.
///
/// Returns `None` when any of the three rates is zero, negative or
/// non-finite. Every other input is clamped to a usable value instead of
/// rejected. The function is pure: identical inputs give identical outputs.
pub fn evaluate_triangle(
    assets: &Triangle,
    rates: TriangleRates,
    params: &EvaluationParams,
) -> Option<ArbitrageResult> {
    let TriangleRates {
        a_to_c,
        b_to_c,
        a_to_b,
    } = rates;
    if ![a_to_c, b_to_c, a_to_b].iter().all(|r| is_valid_rate(*r)) {
        return None;
    }

    let fee_percent = finite_or_zero(params.fee_percent).clamp(0.0, 100.0);
    let notional = if params.starting_notional.is_finite() && params.starting_notional > 0.0 {
        params.starting_notional
    } else {
        DEFAULT_STARTING_NOTIONAL
    };
    let gas_estimate = finite_or_zero(params.gas_estimate).max(0.0);
    let keep = 1.0 - fee_percent / 100.0;

    // C -> A -> B -> C
    let forward = notional / a_to_c * keep * a_to_b * keep * b_to_c * keep;
    // C -> B -> A -> C
    let reverse = notional / b_to_c * keep / a_to_b * keep * a_to_c * keep;

    let forward_pct = profit_percent(forward, notional);
    let reverse_pct = profit_percent(reverse, notional);
    let best_cycle_direction = if forward_pct > reverse_pct {
        CycleDirection::Forward
    } else {
        CycleDirection::Reverse
    };
    let gross = forward_pct.max(reverse_pct);

    let gas_impact_percent = gas_estimate / notional * 100.0;
    let net = gross - gas_impact_percent;

    let min_liquidity_across_legs = params
        .leg_liquidity
        .iter()
        .map(|l| finite_or_zero(*l).max(0.0))
        .fold(f64::INFINITY, f64::min);

    let viable = net.is_finite()
        && net > finite_or_zero(params.min_profit_percent)
        && min_liquidity_across_legs > finite_or_zero(params.min_liquidity)
        && net.abs() < SANITY_CEILING_PERCENT;

    Some(ArbitrageResult {
        assets: assets.clone(),
        best_cycle_direction,
        gross_profit_percent: finite_or_zero(gross),
        net_profit_percent: finite_or_zero(net),
        fees_total_percent: fee_percent * 3.0,
        gas_estimate,
        min_liquidity_across_legs,
        cross_rate_inefficiency_percent: cross_rate_inefficiency_percent(a_to_c, b_to_c, a_to_b),
        viable,
    })
}

/// Deviation of the quoted A/B rate from the one implied by A/C over B/C.
pub fn cross_rate_inefficiency_percent(a_to_c: f64, b_to_c: f64, a_to_b: f64) -> f64 {
    if a_to_b == 0.0 {
        return 0.0;
    }
    let implied = a_to_c / b_to_c;
    finite_or_zero((implied - a_to_b).abs() / a_to_b * 100.0)
}

fn profit_percent(final_amount: f64, notional: f64) -> f64 {
    (final_amount - notional) / notional * 100.0
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn triangle() -> Triangle {
        Triangle::new("A", "B", "C")
    }

    fn scenario_params(leg_liquidity: [f64; 3]) -> EvaluationParams {
        EvaluationParams {
            fee_percent: 0.3,
            starting_notional: 1000.0,
            gas_estimate: 0.5,
            min_profit_percent: 0.1,
            min_liquidity: 1000.0,
            leg_liquidity,
        }
    }

    fn scenario_rates() -> TriangleRates {
        TriangleRates {
            a_to_c: 30.0,
            b_to_c: 3.0,
            a_to_b: 10.2,
        }
    }

    #[test]
    fn mispriced_cross_rate_is_viable_with_deep_legs() {
        let res = evaluate_triangle(&triangle(), scenario_rates(), &scenario_params([5000.0; 3]))
            .expect("valid rates");

        let expected_gross = (1.02 * 0.997f64.powi(3) - 1.0) * 100.0;
        assert_eq!(res.best_cycle_direction, CycleDirection::Forward);
        assert!((res.gross_profit_percent - expected_gross).abs() < 1e-9);
        assert!((res.net_profit_percent - (expected_gross - 0.05)).abs() < 1e-9);
        assert!((res.net_profit_percent - 1.035).abs() < 0.01);
        assert!((res.cross_rate_inefficiency_percent - 1.960_784_313_7).abs() < 1e-6);
        assert!((res.fees_total_percent - 0.9).abs() < EPS);
        assert_eq!(res.min_liquidity_across_legs, 5000.0);
        assert!(res.viable);
    }

    #[test]
    fn shallow_leg_blocks_viability() {
        let res = evaluate_triangle(
            &triangle(),
            scenario_rates(),
            &scenario_params([500.0, 5000.0, 5000.0]),
        )
        .expect("valid rates");
        assert_eq!(res.min_liquidity_across_legs, 500.0);
        assert!(res.net_profit_percent > 0.0);
        assert!(!res.viable);
    }

    #[test]
    fn consistent_rates_have_no_edge_without_costs() {
        for (a_to_c, b_to_c) in [(30.0, 3.0), (8.0, 0.5), (1.0, 4.0), (120.0, 2.5)] {
            let rates = TriangleRates {
                a_to_c,
                b_to_c,
                a_to_b: a_to_c / b_to_c,
            };
            let res = evaluate_triangle(&triangle(), rates, &EvaluationParams::default())
                .expect("valid rates");
            assert!(res.gross_profit_percent.abs() < 1e-9);
            assert!(res.cross_rate_inefficiency_percent.abs() < 1e-9);
        }
    }

    #[test]
    fn reverse_cycle_wins_when_cross_rate_is_cheap() {
        let rates = TriangleRates {
            a_to_c: 30.0,
            b_to_c: 3.0,
            a_to_b: 9.8,
        };
        let res = evaluate_triangle(&triangle(), rates, &EvaluationParams::default())
            .expect("valid rates");
        assert_eq!(res.best_cycle_direction, CycleDirection::Reverse);
        assert!(res.gross_profit_percent > 0.0);
        assert_eq!(
            res.best_cycle_direction.route(&triangle()),
            "C → B → A → C"
        );
    }

    #[test]
    fn gas_never_increases_net_profit() {
        for gas in [0.0, 0.01, 0.5, 25.0, 999.0] {
            let params = EvaluationParams {
                gas_estimate: gas,
                ..scenario_params([5000.0; 3])
            };
            let res = evaluate_triangle(&triangle(), scenario_rates(), &params)
                .expect("valid rates");
            assert!(res.net_profit_percent <= res.gross_profit_percent);
            assert!(
                (res.gross_profit_percent - res.net_profit_percent - gas / 10.0).abs() < 1e-9
            );
        }
    }

    #[test]
    fn identical_inputs_give_identical_outputs() {
        let params = scenario_params([5000.0, 1200.0, 3000.0]);
        let first = evaluate_triangle(&triangle(), scenario_rates(), &params);
        let second = evaluate_triangle(&triangle(), scenario_rates(), &params);
        assert_eq!(first, second);
    }

    #[test]
    fn profit_below_threshold_is_not_viable() {
        let params = EvaluationParams {
            min_profit_percent: 5.0,
            ..scenario_params([5000.0; 3])
        };
        let res = evaluate_triangle(&triangle(), scenario_rates(), &params).expect("valid rates");
        assert!(res.net_profit_percent <= params.min_profit_percent);
        assert!(!res.viable);
    }

    #[test]
    fn liquidity_equal_to_threshold_is_not_viable() {
        let params = scenario_params([1000.0, 5000.0, 5000.0]);
        let res = evaluate_triangle(&triangle(), scenario_rates(), &params).expect("valid rates");
        assert!(!res.viable);
    }

    #[test]
    fn invalid_rates_yield_none() {
        let bad = [0.0, -1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY];
        for v in bad {
            let params = EvaluationParams::default();
            let mut rates = scenario_rates();
            rates.a_to_c = v;
            assert!(evaluate_triangle(&triangle(), rates, &params).is_none());
            let mut rates = scenario_rates();
            rates.b_to_c = v;
            assert!(evaluate_triangle(&triangle(), rates, &params).is_none());
            let mut rates = scenario_rates();
            rates.a_to_b = v;
            assert!(evaluate_triangle(&triangle(), rates, &params).is_none());
        }
    }

    #[test]
    fn absurd_profit_is_rejected_by_sanity_ceiling() {
        let rates = TriangleRates {
            a_to_c: 1.0,
            b_to_c: 1.0,
            a_to_b: 10.0,
        };
        let res = evaluate_triangle(&triangle(), rates, &scenario_params([5000.0; 3]))
            .expect("valid rates");
        assert!(res.net_profit_percent > SANITY_CEILING_PERCENT);
        assert!(!res.viable);
    }

    #[test]
    fn overflowing_cycle_reports_zero_and_is_not_viable() {
        let rates = TriangleRates {
            a_to_c: f64::MAX,
            b_to_c: f64::MIN_POSITIVE,
            a_to_b: 1.0,
        };
        let res = evaluate_triangle(&triangle(), rates, &scenario_params([5000.0; 3]))
            .expect("rates are positive and finite");
        assert_eq!(res.gross_profit_percent, 0.0);
        assert_eq!(res.net_profit_percent, 0.0);
        assert_eq!(res.cross_rate_inefficiency_percent, 0.0);
        assert!(!res.viable);
    }

    #[test]
    fn bad_auxiliary_inputs_are_clamped() {
        let params = EvaluationParams {
            fee_percent: f64::NAN,
            starting_notional: -5.0,
            gas_estimate: -3.0,
            min_profit_percent: f64::NAN,
            min_liquidity: 0.0,
            leg_liquidity: [f64::NAN, 100.0, 100.0],
        };
        let res = evaluate_triangle(&triangle(), scenario_rates(), &params).expect("valid rates");
        assert_eq!(res.fees_total_percent, 0.0);
        assert_eq!(res.gas_estimate, 0.0);
        assert_eq!(res.min_liquidity_across_legs, 0.0);
        assert!((res.gross_profit_percent - 2.0).abs() < 1e-9);
        assert!(!res.viable);
    }
}

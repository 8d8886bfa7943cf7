//! End-to-end engine tests over aligned pairs.

use chrono::{Duration, TimeZone, Utc};
use spreadlab_core::data::{align_pair, AlignMode, AlignedPair};
use spreadlab_core::domain::{Bar, Leg, OrderStatus};
use spreadlab_core::engine::{run_pair_backtest, BrokerConfig, EngineConfig, EvalMode, ValueRecorder};
use spreadlab_core::params::{SpreadMethod, StrategyParams};
use spreadlab_core::signal::PositionState;

fn bars(symbol: &str, closes: &[f64]) -> Vec<Bar> {
    let t0 = Utc.with_ymd_and_hms(2018, 7, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            symbol: symbol.to_string(),
            timestamp: t0 + Duration::hours(i as i64),
            open: c * 0.999,
            high: c * 1.002,
            low: c * 0.997,
            close: c,
            volume: 10.0,
        })
        .collect()
}

fn make_pair(a: &[f64], b: &[f64]) -> AlignedPair {
    align_pair(&bars("BTC", a), &bars("XMR", b), AlignMode::Current).unwrap()
}

/// Oscillating pair whose spread crosses both thresholds several times.
fn oscillating(n: usize) -> (Vec<f64>, Vec<f64>) {
    let b: Vec<f64> = (0..n).map(|i| 50.0 + (i as f64 * 0.05).sin() * 2.0).collect();
    let a: Vec<f64> = b
        .iter()
        .enumerate()
        .map(|(i, pb)| pb * 2.0 * (1.0 + 0.03 * (i as f64 * 0.21).sin() + 0.004 * (i as f64 * 1.7).cos()))
        .collect();
    (a, b)
}

#[test]
fn flat_series_end_to_end() {
    let pair = make_pair(&vec![100.0; 200], &vec![50.0; 200]);
    let params = StrategyParams::symmetric(SpreadMethod::Ratio, 24, 2.0, 0.5).unwrap();
    let result = run_pair_backtest(&pair, &params, &EngineConfig::default(), Vec::new()).unwrap();

    assert_eq!(result.final_state, PositionState::Flat);
    assert!(result.orders.is_empty());
    assert!(result.transitions.is_empty());
    assert_eq!(result.end_value, result.start_value);
    assert_eq!(result.total_commission, 0.0);
    assert!(result.records.iter().all(|r| r.zscore.is_none()));
}

#[test]
fn vectorized_and_step_modes_are_identical() {
    let (a, b) = oscillating(400);
    let pair = make_pair(&a, &b);
    for method in [SpreadMethod::Ratio, SpreadMethod::Ols] {
        let params = StrategyParams::symmetric(method, 20, 1.5, 0.5).unwrap();
        let vectorized = run_pair_backtest(&pair, &params, &EngineConfig::default(), Vec::new())
            .unwrap();
        let step_cfg = EngineConfig {
            eval_mode: EvalMode::Step,
            ..EngineConfig::default()
        };
        let step = run_pair_backtest(&pair, &params, &step_cfg, Vec::new()).unwrap();

        assert_eq!(vectorized.records, step.records, "{method:?}");
        assert_eq!(vectorized.transitions, step.transitions, "{method:?}");
        assert_eq!(vectorized.end_value, step.end_value, "{method:?}");
        assert!(!vectorized.transitions.is_empty(), "{method:?}: no transitions");
    }
}

#[test]
fn step_mode_tracks_vectorized_with_long_ols_window() {
    let (a, b) = oscillating(1500);
    let pair = make_pair(&a, &b);
    let params = StrategyParams::symmetric(SpreadMethod::Ols, 500, 1.0, 0.5).unwrap();
    let vectorized = run_pair_backtest(&pair, &params, &EngineConfig::default(), Vec::new()).unwrap();
    let step_cfg = EngineConfig {
        eval_mode: EvalMode::Step,
        ..EngineConfig::default()
    };
    let step = run_pair_backtest(&pair, &params, &step_cfg, Vec::new()).unwrap();

    assert_eq!(vectorized.records, step.records);
    assert_eq!(vectorized.transitions, step.transitions);
    assert_eq!(vectorized.end_value, step.end_value);
    assert!(step.records[998].zscore.is_some());
    assert!(step.records[997].zscore.is_none());
}

#[test]
fn transitions_alternate_and_never_overlap_orders() {
    let (a, b) = oscillating(600);
    let pair = make_pair(&a, &b);
    let params = StrategyParams::symmetric(SpreadMethod::Ratio, 20, 1.5, 0.5).unwrap();
    let config = EngineConfig {
        broker: BrokerConfig {
            fill_delay: 3,
            ..BrokerConfig::default()
        },
        ..EngineConfig::default()
    };
    let result = run_pair_backtest(&pair, &params, &config, Vec::new()).unwrap();
    assert!(result.transitions.len() >= 2);

    for w in result.transitions.windows(2) {
        assert_eq!(w[0].transition.to, w[1].transition.from);
        // next cycle only after the previous one resolved
        assert!(w[1].step >= w[0].step + 3);
    }
    for tr in &result.transitions {
        let cycle: Vec<_> = result.orders.iter().filter(|o| o.created_step == tr.step).collect();
        assert_eq!(cycle.len(), 2);
        for order in cycle {
            assert_eq!(order.fill_step, tr.step + 3);
        }
    }
}

#[test]
fn fills_never_happen_on_the_signal_step() {
    let (a, b) = oscillating(400);
    let pair = make_pair(&a, &b);
    let params = StrategyParams::symmetric(SpreadMethod::Ols, 20, 1.5, 0.5).unwrap();
    let result = run_pair_backtest(&pair, &params, &EngineConfig::default(), Vec::new()).unwrap();
    let filled: Vec<_> = result
        .orders
        .iter()
        .filter(|o| o.status == OrderStatus::Completed && o.fill_price.is_some())
        .collect();
    assert!(!filled.is_empty());
    for order in filled {
        let step = order.filled_step.unwrap();
        assert!(step > order.created_step);
        let expected = match order.leg {
            Leg::A => pair.a()[step].open,
            Leg::B => pair.b()[step].open,
        };
        assert_eq!(order.fill_price, Some(expected));
    }
}

#[test]
fn analyzers_see_every_step() {
    let (a, b) = oscillating(100);
    let pair = make_pair(&a, &b);
    let params = StrategyParams::symmetric(SpreadMethod::Ratio, 20, 1.5, 0.5).unwrap();
    let result = run_pair_backtest(
        &pair,
        &params,
        &EngineConfig::default(),
        vec![Box::new(ValueRecorder::new())],
    )
    .unwrap();
    assert_eq!(result.equity_curve.len(), pair.len());
    assert_eq!(result.analyzer("final_value"), Some(result.end_value));
}

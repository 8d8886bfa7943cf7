//! Step loop for one pair backtest.

use tracing::{debug, info};

use super::analyzer::Analyzer;
use super::broker::Broker;
use super::state::{EngineConfig, EvalMode, RunResult, StepRecord, TransitionRecord};
use crate::data::AlignedPair;
use crate::params::{ConfigError, StrategyParams};
use crate::signal::SignalMachine;
use crate::spread::{build_model, SpreadStepper};

/// Run a backtest over an aligned pair.
///
/// Configuration is validated before the first step; once the loop starts
/// the run always completes. Orders still open after the last step are
/// cancelled.
pub fn run_pair_backtest(
    pair: &AlignedPair,
    params: &StrategyParams,
    config: &EngineConfig,
    analyzers: Vec<Box<dyn Analyzer>>,
) -> Result<RunResult, ConfigError> {
    params.validate()?;
    let model = build_model(params.method, params.window)?;
    let mut broker = Broker::new(config.broker.clone())?;
    for analyzer in analyzers {
        broker.add_analyzer(analyzer);
    }
    let mut machine = SignalMachine::new(params.clone());

    let closes_a = pair.closes_a();
    let closes_b = pair.closes_b();
    let n = pair.len();

    // Vectorized mode precomputes (spread, z) for every step; step mode walks
    // the prefixes with a stepper.
    let precomputed = match config.eval_mode {
        EvalMode::Vectorized => Some((
            model.spread(&closes_a, &closes_b),
            model.compute_zscore(&closes_a, &closes_b),
        )),
        EvalMode::Step => None,
    };
    let mut stepper = SpreadStepper::new(model.as_ref());

    info!(
        model = model.name(),
        steps = n,
        warmup = model.warmup(),
        mode = ?config.eval_mode,
        "backtest started"
    );

    let mut records = Vec::with_capacity(n);
    let mut transitions = Vec::new();
    let mut equity_curve = Vec::with_capacity(n);

    for t in 0..n {
        let timestamp = pair.timestamp(t);
        let closes = pair.closes_at(t);

        broker.process_fills(t, timestamp, pair.opens_at(t));
        if machine.is_pending() && !broker.has_open_orders() {
            machine.on_order_resolved();
        }

        let (spread, zscore) = match &precomputed {
            Some((spread, z)) => (spread[t], z[t]),
            None => {
                let z = stepper.next(&closes_a[..=t], &closes_b[..=t]);
                (stepper.last_spread(), z)
            }
        };

        if let Some(transition) = machine.on_step(zscore) {
            if config.log_transitions {
                info!(step = t, %timestamp, from = %transition.from, to = %transition.to, z = transition.zscore, "transition");
            } else {
                debug!(step = t, %timestamp, from = %transition.from, to = %transition.to, z = transition.zscore, "transition");
            }
            for order in transition.orders {
                broker.submit_target_percent(order.leg, order.target_weight, t, closes);
            }
            // zero-size orders complete on submission
            if !broker.has_open_orders() {
                machine.on_order_resolved();
            }
            transitions.push(TransitionRecord {
                step: t,
                timestamp,
                transition,
            });
        }

        if t + 1 == n {
            let cancelled = broker.cancel_open();
            if cancelled > 0 {
                debug!(cancelled, "cancelled orders open at end of run");
            }
            if config.liquidate_at_end {
                broker.liquidate(t, timestamp, closes);
                machine.reset_flat();
            } else if machine.is_pending() {
                machine.on_order_resolved();
            }
        }

        let value = broker.portfolio_value(closes);
        broker.notify_value(t, value);
        equity_curve.push(value);
        records.push(StepRecord {
            step: t,
            timestamp,
            close_a: closes[0],
            close_b: closes[1],
            spread,
            zscore,
            state: machine.state(),
            pending: machine.is_pending(),
            cash: broker.cash(),
            portfolio_value: value,
        });
    }

    let analyzers = broker.finish_analyzers();
    let start_value = broker.config().initial_cash;
    let end_value = equity_curve.last().copied().unwrap_or(start_value);
    let total_commission = broker.portfolio().total_commission;

    info!(
        transitions = transitions.len(),
        fills = broker.fills().len(),
        start_value,
        end_value,
        "backtest finished"
    );

    Ok(RunResult {
        model_name: model.name().to_string(),
        warmup: model.warmup(),
        records,
        transitions,
        orders: broker.orders().to_vec(),
        fills: broker.fills().to_vec(),
        final_state: machine.state(),
        start_value,
        end_value,
        total_commission,
        equity_curve,
        analyzers,
    })
}

//! Human-readable run report for stdout.

use std::fmt::Write;

use crate::runner::BacktestResult;
use crate::sweep::SweepResults;

const RULE_WIDTH: usize = 50;

fn fmt_sharpe(sharpe: Option<f64>) -> String {
    sharpe.map_or_else(|| "None".to_string(), |s| format!("{s:.4}"))
}

/// Start/end value and Sharpe banner, followed by supplementary lines.
pub fn format_report(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "START VALUE: {:.2}", m.start_value);
    let _ = writeln!(out, "END VALUE: {:.2}", m.end_value);
    let _ = writeln!(out, "SHARPE: {}", fmt_sharpe(m.sharpe));
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Pair:           {} / {}", result.config.pair.c0, result.config.pair.c1);
    let _ = writeln!(out, "Model:          {} (warm-up {} bars)", result.model, result.warmup);
    let _ = writeln!(out, "Total return:   {:.2}%", m.total_return * 100.0);
    let _ = writeln!(out, "Max drawdown:   {:.2}%", m.max_drawdown * 100.0);
    let _ = writeln!(out, "Transitions:    {}", m.transitions);
    let _ = writeln!(
        out,
        "Orders:         {} filled, {} rejected",
        m.orders_filled, m.orders_rejected
    );
    let _ = writeln!(out, "Commission:     {:.4}", m.total_commission);
    let _ = writeln!(out, "Final state:    {}", result.final_state);
    if result.is_synthetic() {
        let _ = writeln!(out, "Data:           SYNTHETIC");
    }
    out
}

/// One line per grid point, best Sharpe first.
pub fn format_sweep_table(results: &SweepResults) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<8} {:>6} {:>9} {:>10} {:>9} {:>9} {:>6}",
        "method", "period", "threshold", "sharpe", "return%", "maxdd%", "trans"
    );
    for r in results.sorted_by_sharpe() {
        let _ = writeln!(
            out,
            "{:<8} {:>6} {:>9.2} {:>10} {:>9.2} {:>9.2} {:>6}",
            r.model.split('_').next().unwrap_or(""),
            r.config.strategy.spread_period,
            r.config.strategy.threshold,
            fmt_sharpe(r.metrics.sharpe),
            r.metrics.total_return * 100.0,
            r.metrics.max_drawdown * 100.0,
            r.metrics.transitions,
        );
    }
    out
}

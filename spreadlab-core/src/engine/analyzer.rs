//! Observers of the portfolio value series.
//!
//! Analyzers are registered on the broker and see the marked-to-market
//! portfolio value once per step, after fills and order submission.

/// A per-step observer producing one scalar result at the end of a run.
pub trait Analyzer: Send {
    /// Key under which the result is reported.
    fn name(&self) -> &str;

    fn on_value(&mut self, step: usize, value: f64);

    /// Called once after the last step.
    fn finish(&mut self) {}

    /// Final result, `None` when undefined for the observed series.
    fn value(&self) -> Option<f64>;
}

/// Records the value series verbatim. Reports the final value.
#[derive(Debug, Default, Clone)]
pub struct ValueRecorder {
    values: Vec<f64>,
}

impl ValueRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Analyzer for ValueRecorder {
    fn name(&self) -> &str {
        "final_value"
    }

    fn on_value(&mut self, _step: usize, value: f64) {
        self.values.push(value);
    }

    fn value(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

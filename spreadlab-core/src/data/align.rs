//! Pair alignment onto a common step axis.
//!
//! Two modes:
//! - `Current`: inner join on timestamp, a step exists only where both
//!   assets have a bar.
//! - `Legacy`: asset A's timestamps drive the clock and B contributes its
//!   most recent bar at or before each step. Steps before B's first bar are
//!   dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

use crate::domain::Bar;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignError {
    #[error("no overlapping bars between {a} and {b}")]
    NoOverlap { a: String, b: String },

    #[error("misaligned pair: {timestamps} timestamps, {a} bars for A, {b} bars for B")]
    LengthMismatch { timestamps: usize, a: usize, b: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignMode {
    #[default]
    Current,
    Legacy,
}

/// Two bar sequences synchronized on a common step axis.
///
/// `a[i]` and `b[i]` belong to step `timestamps[i]`. In legacy mode `b[i]`
/// keeps its own (possibly older) timestamp. All three sequences always have
/// the same length.
#[derive(Debug, Clone, Default)]
pub struct AlignedPair {
    timestamps: Vec<DateTime<Utc>>,
    a: Vec<Bar>,
    b: Vec<Bar>,
}

impl AlignedPair {
    /// Build a pair from pre-aligned sequences of equal length.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        a: Vec<Bar>,
        b: Vec<Bar>,
    ) -> Result<Self, AlignError> {
        if a.len() != timestamps.len() || b.len() != timestamps.len() {
            return Err(AlignError::LengthMismatch {
                timestamps: timestamps.len(),
                a: a.len(),
                b: b.len(),
            });
        }
        Ok(Self { timestamps, a, b })
    }

    fn push(&mut self, timestamp: DateTime<Utc>, a: &Bar, b: &Bar) {
        self.timestamps.push(timestamp);
        self.a.push(a.clone());
        self.b.push(b.clone());
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn timestamp(&self, t: usize) -> DateTime<Utc> {
        self.timestamps[t]
    }

    pub fn a(&self) -> &[Bar] {
        &self.a
    }

    pub fn b(&self) -> &[Bar] {
        &self.b
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn closes_a(&self) -> Vec<f64> {
        self.a.iter().map(|b| b.close).collect()
    }

    pub fn closes_b(&self) -> Vec<f64> {
        self.b.iter().map(|b| b.close).collect()
    }

    /// Close prices of both legs at one step, ordered `[A, B]`.
    pub fn closes_at(&self, t: usize) -> [f64; 2] {
        [self.a[t].close, self.b[t].close]
    }

    pub fn opens_at(&self, t: usize) -> [f64; 2] {
        [self.a[t].open, self.b[t].open]
    }
}

/// Align two ascending bar sequences.
pub fn align_pair(a: &[Bar], b: &[Bar], mode: AlignMode) -> Result<AlignedPair, AlignError> {
    let pair = match mode {
        AlignMode::Current => inner_join(a, b),
        AlignMode::Legacy => master_clock(a, b),
    };
    if pair.is_empty() {
        let name = |bars: &[Bar]| bars.first().map(|x| x.symbol.clone()).unwrap_or_default();
        return Err(AlignError::NoOverlap {
            a: name(a),
            b: name(b),
        });
    }
    Ok(pair)
}

fn inner_join(a: &[Bar], b: &[Bar]) -> AlignedPair {
    let mut pair = AlignedPair::default();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].timestamp.cmp(&b[j].timestamp) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                pair.push(a[i].timestamp, &a[i], &b[j]);
                i += 1;
                j += 1;
            }
        }
    }
    pair
}

fn master_clock(a: &[Bar], b: &[Bar]) -> AlignedPair {
    let mut pair = AlignedPair::default();
    let mut j = 0;
    let mut latest: Option<&Bar> = None;
    for bar_a in a {
        while j < b.len() && b[j].timestamp <= bar_a.timestamp {
            latest = Some(&b[j]);
            j += 1;
        }
        if let Some(bar_b) = latest {
            pair.push(bar_a.timestamp, bar_a, bar_b);
        }
    }
    pair
}

//! Artifact export: per-step CSV and JSON run summary.
//!
//! - **CSV** (`<filename>.csv`): one row per step with prices, spread,
//!   z-score, regime and portfolio value, for external plotting.
//! - **JSON** (`<filename>.json`): the run summary with config fingerprint,
//!   dataset hash, metrics, transitions and orders.
//!
//! All persisted JSON includes a `schema_version` field. Newer versions are
//! rejected on load.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use spreadlab_core::engine::StepRecord;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },
}

fn io_error(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` summary to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Deserialize a summary, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult, ExportError> {
    let result: BacktestResult = serde_json::from_str(json)?;
    if result.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: result.schema_version,
            max: SCHEMA_VERSION,
        });
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.8}")).unwrap_or_default()
}

/// Export step records as CSV.
///
/// Columns: step, timestamp, close_a, close_b, spread, zscore, state,
/// pending, cash, portfolio_value. Undefined spread/zscore are empty cells.
pub fn export_steps_csv(records: &[StepRecord]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "step",
        "timestamp",
        "close_a",
        "close_b",
        "spread",
        "zscore",
        "state",
        "pending",
        "cash",
        "portfolio_value",
    ])?;
    for r in records {
        wtr.write_record([
            r.step.to_string(),
            r.timestamp.to_rfc3339(),
            format!("{:.8}", r.close_a),
            format!("{:.8}", r.close_b),
            opt(r.spread),
            opt(r.zscore),
            r.state.to_string(),
            r.pending.to_string(),
            format!("{:.6}", r.cash),
            format!("{:.6}", r.portfolio_value),
        ])?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| io_error(Path::new("<memory>"), e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ─── Artifact directory ─────────────────────────────────────────────

/// Paths written by `save_artifacts`.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub summary: PathBuf,
    pub steps: Option<PathBuf>,
}

/// Write `<filename>.json` and, unless disabled, `<filename>.csv` into
/// `output_dir`.
pub fn save_artifacts(
    result: &BacktestResult,
    output_dir: &Path,
    filename: &str,
    write_steps: bool,
) -> Result<ArtifactPaths, ExportError> {
    fs::create_dir_all(output_dir).map_err(|e| io_error(output_dir, e))?;

    let summary = output_dir.join(format!("{filename}.json"));
    fs::write(&summary, export_json(result)?).map_err(|e| io_error(&summary, e))?;

    let steps = if write_steps {
        let path = output_dir.join(format!("{filename}.csv"));
        fs::write(&path, export_steps_csv(&result.records)?).map_err(|e| io_error(&path, e))?;
        Some(path)
    } else {
        None
    };

    Ok(ArtifactPaths { summary, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use spreadlab_core::signal::PositionState;

    fn record(step: usize, zscore: Option<f64>) -> StepRecord {
        StepRecord {
            step,
            timestamp: Utc.with_ymd_and_hms(2018, 7, 1, step as u32, 0, 0).unwrap(),
            close_a: 6400.0,
            close_b: 130.0,
            spread: Some(6400.0 / 130.0),
            zscore,
            state: PositionState::Flat,
            pending: false,
            cash: 1000.0,
            portfolio_value: 1000.0,
        }
    }

    #[test]
    fn steps_csv_has_header_and_rows() {
        let csv = export_steps_csv(&[record(0, None), record(1, Some(1.25))]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("step,timestamp,close_a"));
        assert!(lines[1].contains(",,FLAT,"));
        assert!(lines[2].contains("1.25000000"));
    }
}

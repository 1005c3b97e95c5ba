//! CSV Export
//!
//! Writes the projected record sets to disk. The projector has already
//! rendered every figure as a fixed-point string, so export is a straight
//! pass-through: no value is re-rounded here.

use crate::models::ResultRow;
use crate::projector::RESULT_COLUMNS;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

fn write_rows(path: &Path, rows: &[ResultRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer
        .write_record(RESULT_COLUMNS)
        .context("failed to write CSV header")?;
    for row in rows {
        writer
            .write_record(row.to_record())
            .with_context(|| format!("failed to write record for prefix {}", row.prefix))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

/// Write the main per-prefix result set.
pub fn write_results_csv(path: &Path, rows: &[ResultRow]) -> Result<()> {
    write_rows(path, rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote results CSV");
    Ok(())
}

/// Write the anomaly record set.
pub fn write_anomalies_csv(path: &Path, rows: &[ResultRow]) -> Result<()> {
    write_rows(path, rows)?;
    info!(path = %path.display(), rows = rows.len(), "wrote anomalies CSV");
    Ok(())
}

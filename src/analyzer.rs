//! Aggregation Engine
//!
//! [`RateAnalyzer`] coordinates one batch end to end:
//!
//! 1. **Ingestion**: expand inputs, parse rate sheets, classify rows, fill the
//!    ledger ([`crate::ingest`])
//! 2. **Projection**: run the selector per prefix, stream, and statistic under
//!    the active vendor filter ([`crate::projector`])
//! 3. **Presentation**: terminal tables or JSON ([`crate::display`]) and
//!    optional CSV export ([`crate::export`])
//!
//! Every run allocates a fresh [`Batch`]; nothing carries over between
//! invocations.

use crate::display::DisplayManager;
use crate::export::{write_anomalies_csv, write_results_csv};
use crate::ingest::{ingest_files, Batch};
use crate::models::AggregationPolicy;
use crate::projector::{project_anomalies, project_results};
use crate::vendor::VendorFilter;
use anyhow::Result;
use std::path::PathBuf;
use tracing::warn;

/// Per-run options collected from the CLI (with config-supplied defaults).
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub policy: AggregationPolicy,
    pub filter: VendorFilter,
    pub json_output: bool,
    pub limit: Option<usize>,
    pub output: Option<PathBuf>,
    pub anomalies_output: Option<PathBuf>,
}

pub struct RateAnalyzer {
    display: DisplayManager,
}

impl Default for RateAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl RateAnalyzer {
    pub fn new() -> Self {
        Self {
            display: DisplayManager::new(),
        }
    }

    /// Ingest, aggregate, present, and optionally export one batch.
    pub fn run_aggregate(&self, paths: &[PathBuf], options: &RunOptions) -> Result<()> {
        let batch = ingest_files(paths, options.policy.rate_threshold)?;

        let results = project_results(
            &batch.ledger,
            &options.policy,
            &options.filter,
            options.policy.decimal_places,
        );
        let anomalies = project_anomalies(&batch.anomalies);

        if results.is_empty() && anomalies.is_empty() {
            warn!("no rate data found in any input source");
            if options.json_output {
                self.display
                    .print_json(&batch, &results, &anomalies, &options.policy);
            } else {
                self.display
                    .display_file_summaries(&batch, options.policy.rate_threshold);
                println!("\nNo rate data found in the supplied files.");
            }
            return Ok(());
        }

        if let Some(path) = &options.output {
            let export_rows = self.rows_for_export(&batch, options);
            write_results_csv(path, &export_rows)?;
        }
        if let Some(path) = &options.anomalies_output {
            write_anomalies_csv(path, &anomalies)?;
        }

        if options.json_output {
            self.display
                .print_json(&batch, &results, &anomalies, &options.policy);
        } else {
            self.display
                .display_file_summaries(&batch, options.policy.rate_threshold);
            self.display.display_aggregate(
                &batch,
                &results,
                &anomalies,
                &options.policy,
                options.limit,
            );
        }

        Ok(())
    }

    /// Pre-flight summary only: per-file prefix and anomaly counts.
    pub fn run_summary(&self, paths: &[PathBuf], rate_threshold: f64, json_output: bool) -> Result<()> {
        let batch = ingest_files(paths, rate_threshold)?;

        if json_output {
            self.display.print_summary_json(&batch);
        } else {
            self.display.display_file_summaries(&batch, rate_threshold);
        }
        Ok(())
    }

    /// Export rows are re-projected at the export precision when it differs
    /// from the display precision; otherwise the figures are identical.
    fn rows_for_export(&self, batch: &Batch, options: &RunOptions) -> Vec<crate::models::ResultRow> {
        project_results(
            &batch.ledger,
            &options.policy,
            &options.filter,
            options.policy.final_decimal_places,
        )
    }
}

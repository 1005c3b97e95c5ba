//! Output Formatting and Display Management
//!
//! Terminal and JSON presentation of batch results: the per-file pre-flight
//! summary, the per-prefix aggregate table, and the anomaly report. Human
//! output uses colored sections in the same register as the rest of the
//! tooling; `--json` swaps everything for one structured document.
//!
//! The terminal table shows the flat-vendor stream figures to stay readable;
//! the full 19-column record set is what the CSV export and JSON carry.

use crate::ingest::Batch;
use crate::models::{AggregationPolicy, ResultRow};
use colored::Colorize;

pub struct DisplayManager;

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayManager {
    pub fn new() -> Self {
        Self
    }

    /// Pre-flight summary: one block per input file, plus any failed sources.
    pub fn display_file_summaries(&self, batch: &Batch, rate_threshold: f64) {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!("{}", "Pre-Flight Summary".bright_white().bold());
        println!("{}", "=".repeat(80).bright_cyan());

        for summary in &batch.file_summaries {
            println!("\n{} {}", "📄".bright_yellow(), summary.filename.bright_white().bold());
            println!("   Distinct prefixes: {}", summary.total_prefix_count);
            println!(
                "   Rates above {}: {}",
                format!("{rate_threshold}").bright_yellow(),
                if summary.anomalous_row_count > 0 {
                    summary.anomalous_row_count.to_string().bright_red().bold()
                } else {
                    summary.anomalous_row_count.to_string().normal()
                }
            );
            if summary.malformed_cell_count > 0 {
                println!(
                    "   Malformed rate cells: {}",
                    summary.malformed_cell_count.to_string().bright_red()
                );
            }
        }

        for failure in &batch.failed_sources {
            println!(
                "\n{} {} {}",
                "❌".bright_red(),
                failure.filename.bright_white().bold(),
                failure.error.bright_red()
            );
        }

        if !batch.vendor_names.is_empty() {
            println!(
                "\n{} Vendors seen: {}",
                "🏷".bright_yellow(),
                batch.vendor_names.join(", ")
            );
        }
    }

    /// Main aggregate table plus the anomaly section.
    pub fn display_aggregate(
        &self,
        batch: &Batch,
        results: &[ResultRow],
        anomalies: &[ResultRow],
        policy: &AggregationPolicy,
        limit: Option<usize>,
    ) {
        println!("\n{}", "=".repeat(80).bright_cyan());
        println!(
            "{}",
            format!(
                "Combined Average and LCR-{} Cost Summary",
                policy.lcr_n
            )
            .bright_white()
            .bold()
        );
        println!("{}", "=".repeat(80).bright_cyan());

        println!(
            "\n{} {} prefixes • {} anomalous rows • batch {}\n",
            "📊".bright_yellow(),
            results.len().to_string().bright_white().bold(),
            anomalies.len().to_string().bright_white().bold(),
            batch.id.dimmed()
        );

        println!(
            "{:<12} {:<24} {:>12} {:>14} {:>12}  {}",
            "Prefix".bold(),
            "Description".bold(),
            "Avg".bold(),
            "Cheapest Avg".bold(),
            "LCR Cost".bold(),
            "LCR Source".bold()
        );
        println!("{}", "-".repeat(80).dimmed());

        let shown = limit.unwrap_or(results.len()).min(results.len());
        for row in &results[..shown] {
            println!(
                "{:<12} {:<24} {:>12} {:>14} {:>12}  {}",
                row.prefix,
                truncate(&row.description, 24),
                row.avg_vendor.bright_green(),
                row.cheapest_avg_vendor.bright_green(),
                row.lcr_vendor.bright_green().bold(),
                row.lcr_vendor_file.dimmed()
            );
        }
        if shown < results.len() {
            println!(
                "{}",
                format!("... {} more prefixes (use --output for the full CSV)", results.len() - shown)
                    .dimmed()
            );
        }

        if !anomalies.is_empty() {
            println!("\n{}", "=".repeat(80).bright_cyan());
            println!(
                "{}",
                format!("Rows Above Rate Threshold ({})", policy.rate_threshold)
                    .bright_red()
                    .bold()
            );
            println!("{}", "=".repeat(80).bright_cyan());
            for row in anomalies {
                println!(
                    "{:<12} {:<24} inter={} intra={} vendor={}  {}",
                    row.prefix,
                    truncate(&row.description, 24),
                    blank_dash(&row.avg_inter).bright_red(),
                    blank_dash(&row.avg_intra).bright_red(),
                    blank_dash(&row.avg_vendor).bright_red(),
                    row.lcr_vendor_file.dimmed()
                );
            }
        }
    }

    /// The whole batch as one JSON document.
    pub fn print_json(
        &self,
        batch: &Batch,
        results: &[ResultRow],
        anomalies: &[ResultRow],
        policy: &AggregationPolicy,
    ) {
        let output = serde_json::json!({
            "batchId": batch.id,
            "generatedAt": batch.started_at.to_rfc3339(),
            "policy": policy,
            "fileSummaries": batch.file_summaries,
            "failedSources": batch.failed_sources,
            "vendors": batch.vendor_names,
            "results": results,
            "anomalies": anomalies,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing results to JSON: {}", e),
        }
    }

    /// JSON form of the pre-flight summary alone.
    pub fn print_summary_json(&self, batch: &Batch) {
        let output = serde_json::json!({
            "batchId": batch.id,
            "generatedAt": batch.started_at.to_rfc3339(),
            "fileSummaries": batch.file_summaries,
            "failedSources": batch.failed_sources,
            "vendors": batch.vendor_names,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(json_str) => println!("{}", json_str),
            Err(e) => eprintln!("Error serializing summary to JSON: {}", e),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn blank_dash(text: &str) -> &str {
    if text.is_empty() {
        "-"
    } else {
        text
    }
}

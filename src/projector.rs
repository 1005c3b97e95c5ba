//! Result Projector
//!
//! Converts the ledger plus the configured statistics into flat, ordered
//! output records ready for display and CSV export. For every prefix and every
//! rate stream it computes the plain average, the cheapest-window average, and
//! the LCR-tier cost under the active vendor filter, then formats each figure
//! as a fixed-point string with exactly the requested number of fractional
//! digits (zero-padded, standard rounding).
//!
//! Rows are emitted in ascending prefix order, so repeated runs over the same
//! ledger with the same configuration produce bit-identical output.

use crate::ingest::Batch;
use crate::ledger::PrefixLedger;
use crate::models::{
    AggregationPolicy, AnomalousRow, PrefixRecord, RateStream, ResultRow, COL_BILLING_SCHEME,
    COL_CURRENCY, COL_DESCRIPTION, COL_RATE_INTER, COL_RATE_INTRA, COL_RATE_VENDOR,
};
use crate::selector::{cheapest_window, lcr_tier_cost, plain_average};
use crate::vendor::VendorFilter;
use rayon::prelude::*;

/// Fixed export column order for both the main result set and the anomaly set.
pub const RESULT_COLUMNS: [&str; 19] = [
    "Prefix",
    "Description",
    "Average Rate (inter, vendor's currency)",
    "Average Rate (intra, vendor's currency)",
    "Average Rate (vendor's currency)",
    "Cheapest Avg (inter, vendor's currency)",
    "Cheapest Avg (intra, vendor's currency)",
    "Cheapest Avg (vendor's currency)",
    "LCR Cost (inter, vendor's currency)",
    "LCR Cost (intra, vendor's currency)",
    "LCR Cost (vendor's currency)",
    "Vendor's currency",
    "Billing scheme",
    "Cheapest Inter-Vendor File",
    "Cheapest Intra-Vendor File",
    "Cheapest Vendor File",
    "LCR Inter-Vendor File",
    "LCR Intra-Vendor File",
    "LCR Vendor File",
];

/// Fixed-point formatting with zero padding, e.g. `0.05` at 3 places is `"0.050"`.
pub fn format_rate(value: f64, decimal_places: usize) -> String {
    format!("{value:.decimal_places$}")
}

struct StreamFigures {
    avg: String,
    cheapest_avg: String,
    lcr: String,
    cheapest_file: String,
    lcr_file: String,
}

fn stream_figures(
    record: &PrefixRecord,
    stream: RateStream,
    policy: &AggregationPolicy,
    filter: &VendorFilter,
    decimal_places: usize,
) -> StreamFigures {
    let entries = record.stream(stream);

    let avg = plain_average(entries, filter);
    let window = cheapest_window(
        entries,
        filter,
        policy.cheapest_n,
        policy.exclude_first_cheapest,
        policy.most_expensive,
    );
    let tier = lcr_tier_cost(entries, filter, policy.lcr_n);

    StreamFigures {
        avg: format_rate(avg, decimal_places),
        cheapest_avg: format_rate(window.average, decimal_places),
        lcr: format_rate(tier.cost, decimal_places),
        cheapest_file: window.source_file.unwrap_or_default(),
        lcr_file: tier.source_file.unwrap_or_default(),
    }
}

fn project_record(
    prefix: &str,
    record: &PrefixRecord,
    policy: &AggregationPolicy,
    filter: &VendorFilter,
    decimal_places: usize,
) -> ResultRow {
    let inter = stream_figures(record, RateStream::Inter, policy, filter, decimal_places);
    let intra = stream_figures(record, RateStream::Intra, policy, filter, decimal_places);
    let vendor = stream_figures(record, RateStream::Vendor, policy, filter, decimal_places);

    ResultRow {
        prefix: prefix.to_string(),
        description: record.description.clone().unwrap_or_default(),
        avg_inter: inter.avg,
        avg_intra: intra.avg,
        avg_vendor: vendor.avg,
        cheapest_avg_inter: inter.cheapest_avg,
        cheapest_avg_intra: intra.cheapest_avg,
        cheapest_avg_vendor: vendor.cheapest_avg,
        lcr_inter: inter.lcr,
        lcr_intra: intra.lcr,
        lcr_vendor: vendor.lcr,
        currency: record.currency.clone().unwrap_or_default(),
        billing_scheme: record.billing_scheme.clone().unwrap_or_default(),
        cheapest_inter_file: inter.cheapest_file,
        cheapest_intra_file: intra.cheapest_file,
        cheapest_vendor_file: vendor.cheapest_file,
        lcr_inter_file: inter.lcr_file,
        lcr_intra_file: intra.lcr_file,
        lcr_vendor_file: vendor.lcr_file,
    }
}

/// Project the main result set: one row per prefix, sorted by prefix.
///
/// `decimal_places` is passed explicitly because the display and export
/// surfaces may request different precisions from the same batch.
pub fn project_results(
    ledger: &PrefixLedger,
    policy: &AggregationPolicy,
    filter: &VendorFilter,
    decimal_places: usize,
) -> Vec<ResultRow> {
    ledger
        .iter_sorted()
        .into_par_iter()
        .map(|(prefix, record)| project_record(prefix, record, policy, filter, decimal_places))
        .collect()
}

/// Project anomalous rows into the same flat shape: raw rate cells in the
/// average columns, blanks for every computed figure, and the originating file
/// in the provenance columns.
pub fn project_anomalies(anomalies: &[AnomalousRow]) -> Vec<ResultRow> {
    anomalies
        .iter()
        .map(|row| {
            let source = row.source_file.clone();
            ResultRow {
                prefix: row.prefix.clone(),
                description: row.fields.get(COL_DESCRIPTION).cloned().unwrap_or_default(),
                avg_inter: row.fields.get(COL_RATE_INTER).cloned().unwrap_or_default(),
                avg_intra: row.fields.get(COL_RATE_INTRA).cloned().unwrap_or_default(),
                avg_vendor: row.fields.get(COL_RATE_VENDOR).cloned().unwrap_or_default(),
                currency: row.fields.get(COL_CURRENCY).cloned().unwrap_or_default(),
                billing_scheme: row
                    .fields
                    .get(COL_BILLING_SCHEME)
                    .cloned()
                    .unwrap_or_default(),
                cheapest_inter_file: source.clone(),
                cheapest_intra_file: source.clone(),
                cheapest_vendor_file: source.clone(),
                lcr_inter_file: source.clone(),
                lcr_intra_file: source.clone(),
                lcr_vendor_file: source,
                ..ResultRow::default()
            }
        })
        .collect()
}

/// Convenience wrapper projecting a whole batch at display precision.
pub fn project_batch(
    batch: &Batch,
    policy: &AggregationPolicy,
    filter: &VendorFilter,
) -> (Vec<ResultRow>, Vec<ResultRow>) {
    (
        project_results(&batch.ledger, policy, filter, policy.decimal_places),
        project_anomalies(&batch.anomalies),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawRow, COL_RATE_VENDOR};
    use std::collections::HashMap;

    fn ledger_row(prefix: &str, source: &str, fields: &[(&str, &str)]) -> RawRow {
        RawRow {
            prefix: prefix.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            source_file: source.to_string(),
        }
    }

    fn two_vendor_ledger() -> PrefixLedger {
        // vendorA supplies 0.05 and 0.03, vendorB supplies 0.10, all for prefix 1.
        let mut ledger = PrefixLedger::new();
        ledger.record_row(&ledger_row(
            "1",
            "vendorA.csv",
            &[(COL_RATE_VENDOR, "0.05"), (COL_DESCRIPTION, "Canada")],
        ));
        ledger.record_row(&ledger_row("1", "vendorA.csv", &[(COL_RATE_VENDOR, "0.03")]));
        ledger.record_row(&ledger_row("1", "vendorB.csv", &[(COL_RATE_VENDOR, "0.10")]));
        ledger
    }

    #[test]
    fn end_to_end_two_file_scenario() {
        let ledger = two_vendor_ledger();
        let policy = AggregationPolicy {
            lcr_n: 4,
            cheapest_n: 1,
            exclude_first_cheapest: true,
            ..AggregationPolicy::default()
        };

        let rows = project_results(&ledger, &policy, &VendorFilter::All, 2);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];

        // Plain average: (0.05 + 0.03 + 0.10) / 3 = 0.06.
        assert_eq!(row.avg_vendor, "0.06");
        // Cheapest-1 excluding first: drop 0.03, take 0.05.
        assert_eq!(row.cheapest_avg_vendor, "0.05");
        assert_eq!(row.cheapest_vendor_file, "vendorA.csv");
        // LCR-4 with only 3 eligible entries: k == 3 rule, most expensive of the three.
        assert_eq!(row.lcr_vendor, "0.10");
        assert_eq!(row.lcr_vendor_file, "vendorB.csv");
        assert_eq!(row.description, "Canada");
    }

    #[test]
    fn formatting_zero_pads_to_requested_precision() {
        assert_eq!(format_rate(0.05, 3), "0.050");
        assert_eq!(format_rate(0.0, 6), "0.000000");
        assert_eq!(format_rate(1.23456789, 4), "1.2346");
        assert_eq!(format_rate(2.0, 0), "2");
    }

    #[test]
    fn projection_is_idempotent() {
        let ledger = two_vendor_ledger();
        let policy = AggregationPolicy::default();
        let first = project_results(&ledger, &policy, &VendorFilter::All, 6);
        let second = project_results(&ledger, &policy, &VendorFilter::All, 6);
        assert_eq!(first, second);
    }

    #[test]
    fn rows_come_out_sorted_by_prefix() {
        let mut ledger = PrefixLedger::new();
        for prefix in ["49", "1", "44"] {
            ledger.record_row(&ledger_row(prefix, "a.csv", &[(COL_RATE_VENDOR, "0.01")]));
        }
        let rows = project_results(&ledger, &AggregationPolicy::default(), &VendorFilter::All, 6);
        let prefixes: Vec<&str> = rows.iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["1", "44", "49"]);
    }

    #[test]
    fn empty_streams_yield_zero_figures_and_blank_provenance() {
        let mut ledger = PrefixLedger::new();
        ledger.record_row(&ledger_row("7", "a.csv", &[(COL_RATE_VENDOR, "0.02")]));

        let rows = project_results(&ledger, &AggregationPolicy::default(), &VendorFilter::All, 6);
        let row = &rows[0];
        assert_eq!(row.avg_inter, "0.000000");
        assert_eq!(row.lcr_inter, "0.000000");
        assert_eq!(row.cheapest_inter_file, "");
        assert_eq!(row.lcr_inter_file, "");
    }

    #[test]
    fn anomaly_projection_keeps_raw_cells_and_blanks_computed_columns() {
        let mut fields = HashMap::new();
        fields.insert(COL_RATE_VENDOR.to_string(), "1.5".to_string());
        fields.insert(COL_DESCRIPTION.to_string(), "UK".to_string());
        fields.insert(COL_CURRENCY.to_string(), "USD".to_string());

        let rows = project_anomalies(&[AnomalousRow {
            prefix: "44".to_string(),
            fields,
            source_file: "vendorA.csv".to_string(),
            warnings: vec![],
        }]);

        let row = &rows[0];
        assert_eq!(row.prefix, "44");
        assert_eq!(row.avg_vendor, "1.5");
        assert_eq!(row.lcr_vendor, "");
        assert_eq!(row.cheapest_avg_vendor, "");
        assert_eq!(row.currency, "USD");
        assert_eq!(row.lcr_vendor_file, "vendorA.csv");
    }
}

//! End-to-end engine tests: ingest real CSV files from disk, aggregate, and
//! check the projected figures and provenance.

use lcr_rates::ingest::ingest_files;
use lcr_rates::models::AggregationPolicy;
use lcr_rates::projector::{project_anomalies, project_results};
use lcr_rates::vendor::VendorFilter;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = "Prefix,Description,\"Rate (inter, vendor's currency)\",\"Rate (intra, vendor's currency)\",Rate (vendor's currency),Vendor's currency,Billing scheme,Vendor\n";

fn write_csv(dir: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut body = HEADER.to_string();
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn two_file_scenario_produces_expected_figures() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write_csv(
        &dir,
        "vendorA.csv",
        &["1,Canada,,,0.05,USD,1/1,Acme", "1,Canada,,,0.03,USD,1/1,Acme"],
    );
    let b = write_csv(&dir, "vendorB.csv", &["1,Canada,,,0.10,USD,1/1,Best"]);

    let batch = ingest_files(&[a, b], 1.0)?;
    let policy = AggregationPolicy {
        lcr_n: 4,
        cheapest_n: 1,
        exclude_first_cheapest: true,
        ..AggregationPolicy::default()
    };

    let rows = project_results(&batch.ledger, &policy, &VendorFilter::All, 6);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];

    assert_eq!(row.avg_vendor, "0.060000");
    assert_eq!(row.cheapest_avg_vendor, "0.050000");
    assert_eq!(row.cheapest_vendor_file, "vendorA.csv");
    assert_eq!(row.lcr_vendor, "0.100000");
    assert_eq!(row.lcr_vendor_file, "vendorB.csv");
    assert_eq!(row.currency, "USD");

    assert_eq!(batch.vendor_names, vec!["Acme", "Best"]);
    Ok(())
}

#[test]
fn anomalous_row_is_excluded_from_aggregation_but_reported() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_csv(
        &dir,
        "vendorA.csv",
        &["44,UK,,,0.20,USD,1/1,", "44,UK,,,1.50,USD,1/1,"],
    );

    let batch = ingest_files(&[path], 1.0)?;
    let policy = AggregationPolicy::default();

    let rows = project_results(&batch.ledger, &policy, &VendorFilter::All, 6);
    assert_eq!(rows.len(), 1);
    // Only the 0.20 row contributes; with one eligible entry the tier cost is
    // that sole value.
    assert_eq!(rows[0].avg_vendor, "0.200000");
    assert_eq!(rows[0].lcr_vendor, "0.200000");

    let anomalies = project_anomalies(&batch.anomalies);
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].prefix, "44");
    assert_eq!(anomalies[0].avg_vendor, "1.50");
    assert_eq!(anomalies[0].lcr_vendor, "");
    assert_eq!(anomalies[0].lcr_vendor_file, "vendorA.csv");
    Ok(())
}

#[test]
fn anomalous_only_prefix_yields_zero_aggregates() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_csv(&dir, "vendorA.csv", &["99,Nowhere,,,9.99,USD,1/1,"]);

    let batch = ingest_files(&[path], 1.0)?;
    let rows = project_results(
        &batch.ledger,
        &AggregationPolicy::default(),
        &VendorFilter::All,
        6,
    );
    // The only row was diverted, so the prefix never reached the ledger.
    assert!(rows.is_empty());
    assert_eq!(batch.anomalies.len(), 1);
    Ok(())
}

#[test]
fn vendor_filters_shape_the_eligible_set() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write_csv(&dir, "vendorA.csv", &["1,,,,0.02,,,"]);
    let b = write_csv(&dir, "vendorB.csv", &["1,,,,0.08,,,"]);

    let batch = ingest_files(&[a, b], 1.0)?;
    let policy = AggregationPolicy::default();

    let include_a = VendorFilter::include(["vendorA"]);
    let rows = project_results(&batch.ledger, &policy, &include_a, 6);
    assert_eq!(rows[0].avg_vendor, "0.020000");

    let exclude_a = VendorFilter::exclude(["vendorA"]);
    let rows = project_results(&batch.ledger, &policy, &exclude_a, 6);
    assert_eq!(rows[0].avg_vendor, "0.080000");

    // Filtering everything out is a valid, zero-valued case.
    let exclude_all = VendorFilter::exclude(["vendorA", "vendorB"]);
    let rows = project_results(&batch.ledger, &policy, &exclude_all, 6);
    assert_eq!(rows[0].avg_vendor, "0.000000");
    assert_eq!(rows[0].lcr_vendor_file, "");
    Ok(())
}

#[test]
fn repeated_projection_is_bit_identical() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let path = write_csv(
        &dir,
        "vendorA.csv",
        &["1,,0.011,0.022,0.033,,,", "2,,0.044,0.055,0.066,,,"],
    );

    let batch = ingest_files(&[path], 1.0)?;
    let policy = AggregationPolicy::default();
    let first = project_results(&batch.ledger, &policy, &VendorFilter::All, 6);
    let second = project_results(&batch.ledger, &policy, &VendorFilter::All, 6);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn batches_do_not_share_state() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let a = write_csv(&dir, "vendorA.csv", &["1,,,,0.02,,,"]);
    let b = write_csv(&dir, "vendorB.csv", &["2,,,,0.08,,,"]);

    let first = ingest_files(&[a], 1.0)?;
    let second = ingest_files(&[b], 1.0)?;

    assert_ne!(first.id, second.id);
    assert!(first.ledger.get("2").is_none());
    assert!(second.ledger.get("1").is_none());
    Ok(())
}

#[test]
fn missing_prefix_value_fails_the_whole_batch() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let good = write_csv(&dir, "good.csv", &["1,,,,0.02,,,"]);
    let bad = write_csv(&dir, "bad.csv", &["2,,,,0.08,,,", ",,,0.09,,,,"]);

    let err = ingest_files(&[good, bad], 1.0).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bad.csv"), "diagnostic was: {message}");
    Ok(())
}

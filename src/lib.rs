//! LCR Rates Library
//!
//! Aggregates carrier least-cost-routing (LCR) rate sheets. CSV rows are
//! bucketed by dialing prefix into three independent rate streams (inter,
//! intra, flat vendor), then summarized per prefix: a plain average, a
//! cheapest-window average, and an LCR-tier cost (the Nth-cheapest rate with
//! small-sample fallback rules), each with the source file of the selected
//! rate as provenance. Rows whose rates exceed an operator threshold are set
//! aside as anomalies before aggregation.
//!
//! ## Architecture Overview
//!
//! - [`models`] - core data structures and the recognized column schema
//! - [`ingest`] - file expansion, decoding, CSV parsing, batch assembly
//! - [`ledger`] - the per-prefix accumulator map
//! - [`classifier`] - anomaly threshold classification
//! - [`vendor`] - include/exclude vendor filtering over provenance labels
//! - [`selector`] - the averaging and tier-selection algorithms
//! - [`projector`] - flat, ordered, precision-formatted output records
//! - [`export`] - CSV export of the projected record sets
//! - [`analyzer`] - orchestration of one batch end to end
//! - [`display`] - terminal and JSON presentation
//! - [`config`] / [`logging`] - configuration and structured logging
//!
//! ## Main Entry Point
//!
//! ```rust,no_run
//! use lcr_rates::analyzer::{RateAnalyzer, RunOptions};
//! use lcr_rates::models::AggregationPolicy;
//! use lcr_rates::vendor::VendorFilter;
//!
//! # fn example() -> anyhow::Result<()> {
//! let analyzer = RateAnalyzer::new();
//! let options = RunOptions {
//!     policy: AggregationPolicy::default(),
//!     filter: VendorFilter::All,
//!     json_output: false,
//!     limit: None,
//!     output: None,
//!     anomalies_output: None,
//! };
//! analyzer.run_aggregate(&["rates/vendorA.csv".into()], &options)?;
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod display;
pub mod export;
pub mod ingest;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod projector;
pub mod selector;
pub mod vendor;

pub use analyzer::{RateAnalyzer, RunOptions};
pub use models::*;

//! Core Data Models
//!
//! Defines the data structures used throughout the rate aggregation pipeline:
//!
//! 1. **Raw Data**: [`RawRow`] - Individual rows parsed from rate sheet CSVs
//! 2. **Accumulation**: [`RateEntry`], [`PrefixRecord`] - Rates bucketed per prefix
//! 3. **Configuration**: [`AggregationPolicy`] - Knobs for the selector and classifier
//! 4. **Output**: [`ResultRow`], [`FileSummary`] - Serializable records for reports
//!
//! Rate sheets use a fixed, recognized column schema (the `COL_*` constants).
//! Unrecognized columns are carried through untouched on anomalous rows but are
//! never consulted by the aggregation logic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dialing prefix column. A row without a non-empty value here is invalid input.
pub const COL_PREFIX: &str = "Prefix";
pub const COL_DESCRIPTION: &str = "Description";
pub const COL_RATE_INTER: &str = "Rate (inter, vendor's currency)";
pub const COL_RATE_INTRA: &str = "Rate (intra, vendor's currency)";
pub const COL_RATE_VENDOR: &str = "Rate (vendor's currency)";
pub const COL_CURRENCY: &str = "Vendor's currency";
pub const COL_BILLING_SCHEME: &str = "Billing scheme";
/// Optional vendor name column, surveyed for the filter-selection summary.
pub const COL_VENDOR: &str = "Vendor";

/// The three independent rate streams a row may contribute to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateStream {
    Inter,
    Intra,
    Vendor,
}

impl RateStream {
    pub const ALL: [RateStream; 3] = [RateStream::Inter, RateStream::Intra, RateStream::Vendor];

    /// The CSV column this stream is fed from.
    pub fn column(&self) -> &'static str {
        match self {
            RateStream::Inter => COL_RATE_INTER,
            RateStream::Intra => COL_RATE_INTRA,
            RateStream::Vendor => COL_RATE_VENDOR,
        }
    }
}

/// A single materialized rate with its provenance.
///
/// Invariant: `value` is finite and non-negative. Cells that fail numeric
/// parsing or carry negative values are never materialized into entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateEntry {
    pub value: f64,
    #[serde(rename = "sourceFile")]
    pub source_file: String,
}

impl RateEntry {
    pub fn new(value: f64, source_file: impl Into<String>) -> Self {
        Self {
            value,
            source_file: source_file.into(),
        }
    }
}

/// Per-prefix accumulator: three rate streams plus first-write-wins metadata.
///
/// Entries keep insertion order (row arrival order); the selector relies on
/// this as the tie-break for "first" semantics. Metadata fields, once set to a
/// non-empty value, never change for the life of the batch.
#[derive(Debug, Clone, Default)]
pub struct PrefixRecord {
    pub inter_vendor_rates: Vec<RateEntry>,
    pub intra_vendor_rates: Vec<RateEntry>,
    pub vendor_rates: Vec<RateEntry>,
    pub description: Option<String>,
    pub currency: Option<String>,
    pub billing_scheme: Option<String>,
}

impl PrefixRecord {
    pub fn stream(&self, stream: RateStream) -> &[RateEntry] {
        match stream {
            RateStream::Inter => &self.inter_vendor_rates,
            RateStream::Intra => &self.intra_vendor_rates,
            RateStream::Vendor => &self.vendor_rates,
        }
    }

    pub fn stream_mut(&mut self, stream: RateStream) -> &mut Vec<RateEntry> {
        match stream {
            RateStream::Inter => &mut self.inter_vendor_rates,
            RateStream::Intra => &mut self.intra_vendor_rates,
            RateStream::Vendor => &mut self.vendor_rates,
        }
    }
}

/// One decoded CSV row, tagged with its source file identifier.
///
/// `source_file` is the input file name the row came from. `fields` holds
/// every header/cell pair verbatim; missing recognized columns read as empty
/// strings via [`RawRow::field`].
#[derive(Debug, Clone, Serialize)]
pub struct RawRow {
    pub prefix: String,
    pub fields: HashMap<String, String>,
    #[serde(rename = "sourceFile")]
    pub source_file: String,
}

impl RawRow {
    /// Cell value for a column, empty string when the column is absent.
    pub fn field(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Selection and formatting knobs for one aggregation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationPolicy {
    /// Tier for the LCR cost figure (rank of the chosen rate, 1-indexed).
    pub lcr_n: usize,
    /// Window size for the cheapest-window average.
    pub cheapest_n: usize,
    /// Drop the single cheapest eligible rate before windowing.
    pub exclude_first_cheapest: bool,
    /// Window from the expensive end of the sorted rates instead.
    pub most_expensive: bool,
    /// Fractional digits for displayed figures.
    pub decimal_places: usize,
    /// Fractional digits for exported figures.
    pub final_decimal_places: usize,
    /// A rate strictly above this marks its whole row anomalous.
    pub rate_threshold: f64,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self {
            lcr_n: 4,
            cheapest_n: 4,
            exclude_first_cheapest: false,
            most_expensive: false,
            decimal_places: 6,
            final_decimal_places: 6,
            rate_threshold: 1.0,
        }
    }
}

/// Per-file pre-flight counters, reported before the aggregate output.
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub filename: String,
    #[serde(rename = "totalPrefixCount")]
    pub total_prefix_count: usize,
    #[serde(rename = "anomalousRowCount")]
    pub anomalous_row_count: usize,
    #[serde(rename = "malformedCellCount")]
    pub malformed_cell_count: usize,
}

/// An input row diverted from aggregation because a rate exceeded the threshold.
///
/// The original field mapping is kept verbatim so the row can be reported and
/// exported exactly as it arrived.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalousRow {
    pub prefix: String,
    pub fields: HashMap<String, String>,
    #[serde(rename = "sourceFile")]
    pub source_file: String,
    pub warnings: Vec<String>,
}

/// A flat, ordered output record: one per prefix in the main result set, one
/// per flagged input row in the anomaly set. All rate figures are fixed-point
/// strings already formatted to the requested precision; anomaly records carry
/// the raw rate cells in the average columns and blanks in the computed ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub prefix: String,
    pub description: String,
    #[serde(rename = "avgInter")]
    pub avg_inter: String,
    #[serde(rename = "avgIntra")]
    pub avg_intra: String,
    #[serde(rename = "avgVendor")]
    pub avg_vendor: String,
    #[serde(rename = "cheapestAvgInter")]
    pub cheapest_avg_inter: String,
    #[serde(rename = "cheapestAvgIntra")]
    pub cheapest_avg_intra: String,
    #[serde(rename = "cheapestAvgVendor")]
    pub cheapest_avg_vendor: String,
    #[serde(rename = "lcrInter")]
    pub lcr_inter: String,
    #[serde(rename = "lcrIntra")]
    pub lcr_intra: String,
    #[serde(rename = "lcrVendor")]
    pub lcr_vendor: String,
    pub currency: String,
    #[serde(rename = "billingScheme")]
    pub billing_scheme: String,
    #[serde(rename = "cheapestInterFile")]
    pub cheapest_inter_file: String,
    #[serde(rename = "cheapestIntraFile")]
    pub cheapest_intra_file: String,
    #[serde(rename = "cheapestVendorFile")]
    pub cheapest_vendor_file: String,
    #[serde(rename = "lcrInterFile")]
    pub lcr_inter_file: String,
    #[serde(rename = "lcrIntraFile")]
    pub lcr_intra_file: String,
    #[serde(rename = "lcrVendorFile")]
    pub lcr_vendor_file: String,
}

impl Default for ResultRow {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            description: String::new(),
            avg_inter: String::new(),
            avg_intra: String::new(),
            avg_vendor: String::new(),
            cheapest_avg_inter: String::new(),
            cheapest_avg_intra: String::new(),
            cheapest_avg_vendor: String::new(),
            lcr_inter: String::new(),
            lcr_intra: String::new(),
            lcr_vendor: String::new(),
            currency: String::new(),
            billing_scheme: String::new(),
            cheapest_inter_file: String::new(),
            cheapest_intra_file: String::new(),
            cheapest_vendor_file: String::new(),
            lcr_inter_file: String::new(),
            lcr_intra_file: String::new(),
            lcr_vendor_file: String::new(),
        }
    }
}

impl ResultRow {
    /// Values in the fixed export column order ([`crate::projector::RESULT_COLUMNS`]).
    pub fn to_record(&self) -> Vec<&str> {
        vec![
            &self.prefix,
            &self.description,
            &self.avg_inter,
            &self.avg_intra,
            &self.avg_vendor,
            &self.cheapest_avg_inter,
            &self.cheapest_avg_intra,
            &self.cheapest_avg_vendor,
            &self.lcr_inter,
            &self.lcr_intra,
            &self.lcr_vendor,
            &self.currency,
            &self.billing_scheme,
            &self.cheapest_inter_file,
            &self.cheapest_intra_file,
            &self.cheapest_vendor_file,
            &self.lcr_inter_file,
            &self.lcr_intra_file,
            &self.lcr_vendor_file,
        ]
    }
}

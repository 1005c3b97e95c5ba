//! Prefix Ledger
//!
//! The central batch data structure: a map from dialing prefix to a
//! [`PrefixRecord`] accumulating the three rate streams and the
//! first-write-wins metadata. A ledger lives for exactly one batch; the next
//! batch allocates a fresh one.
//!
//! Ingestion is tolerant of malformed individual cells: a rate cell that is
//! present but fails to parse, is negative, or is non-finite is treated as
//! absent for its column and logged. Only a missing prefix is a structural
//! error, and that is enforced upstream in ingestion before rows reach the
//! ledger.

use crate::models::{
    PrefixRecord, RateEntry, RateStream, RawRow, COL_BILLING_SCHEME, COL_CURRENCY, COL_DESCRIPTION,
};
use std::collections::HashMap;
use tracing::debug;

/// Parse a rate cell into a materializable value.
///
/// Returns `None` for empty, non-numeric, non-finite, or negative cells;
/// those never become [`RateEntry`] values.
pub fn parse_rate(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct PrefixLedger {
    records: HashMap<String, PrefixRecord>,
}

impl PrefixLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one row into the ledger: append a [`RateEntry`] per present,
    /// parseable rate column and fill any still-unset metadata field with the
    /// row's non-empty value.
    pub fn record_row(&mut self, row: &RawRow) {
        let record = self.records.entry(row.prefix.clone()).or_default();

        for stream in RateStream::ALL {
            let cell = row.field(stream.column());
            if cell.trim().is_empty() {
                continue;
            }
            match parse_rate(cell) {
                Some(value) => record
                    .stream_mut(stream)
                    .push(RateEntry::new(value, row.source_file.clone())),
                None => debug!(
                    prefix = %row.prefix,
                    source = %row.source_file,
                    column = stream.column(),
                    cell,
                    "dropping unusable rate cell"
                ),
            }
        }

        if record.description.is_none() {
            let description = row.field(COL_DESCRIPTION).trim();
            if !description.is_empty() {
                record.description = Some(description.to_string());
            }
        }
        if record.currency.is_none() {
            let currency = row.field(COL_CURRENCY).trim();
            if !currency.is_empty() {
                record.currency = Some(currency.to_string());
            }
        }
        if record.billing_scheme.is_none() {
            let billing_scheme = row.field(COL_BILLING_SCHEME).trim();
            if !billing_scheme.is_empty() {
                record.billing_scheme = Some(billing_scheme.to_string());
            }
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&PrefixRecord> {
        self.records.get(prefix)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending prefix order. The projector iterates this so the
    /// output order is deterministic run-to-run.
    pub fn iter_sorted(&self) -> Vec<(&str, &PrefixRecord)> {
        let mut entries: Vec<(&str, &PrefixRecord)> = self
            .records
            .iter()
            .map(|(prefix, record)| (prefix.as_str(), record))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

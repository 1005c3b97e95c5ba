//! Vendor Filter
//!
//! A pure predicate over [`RateEntry`] provenance labels, derived from either
//! an include-list or an exclude-list of vendor names (never both). The filter
//! is applied by the selector before any statistic is computed.
//!
//! Source-file labels and filter-set values go through the same normalization:
//! a leading `dial_peer` token is stripped, `.csv`/`.zip` suffixes are dropped,
//! and underscores become spaces. Matching is exact post-normalization; no
//! case folding is applied.

use crate::models::RateEntry;
use anyhow::{bail, Result};
use std::collections::HashSet;

/// Normalize a source-file label into a vendor name.
///
/// `dial_peer_acme_telecom.csv` becomes ` acme telecom` - the leading space is
/// a deliberate artifact of the historical cleanup rule and is matched exactly.
pub fn normalize_source_label(name: &str) -> String {
    let mut label = name.strip_prefix("dial_peer").unwrap_or(name);
    loop {
        if let Some(rest) = label.strip_suffix(".csv") {
            label = rest;
        } else if let Some(rest) = label.strip_suffix(".zip") {
            label = rest;
        } else {
            break;
        }
    }
    label.replace('_', " ")
}

/// Include/exclude predicate over normalized vendor labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum VendorFilter {
    /// No filtering configured; every entry passes.
    #[default]
    All,
    Include(HashSet<String>),
    Exclude(HashSet<String>),
}

impl VendorFilter {
    pub fn include<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        VendorFilter::Include(Self::normalized_set(names))
    }

    pub fn exclude<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        VendorFilter::Exclude(Self::normalized_set(names))
    }

    /// Build a filter from the two CLI/config lists. The lists are mutually
    /// exclusive; both being non-empty is a caller error.
    pub fn from_lists(include: &[String], exclude: &[String]) -> Result<Self> {
        match (include.is_empty(), exclude.is_empty()) {
            (true, true) => Ok(VendorFilter::All),
            (false, true) => Ok(Self::include(include)),
            (true, false) => Ok(Self::exclude(exclude)),
            (false, false) => {
                bail!("vendor include and exclude lists cannot both be set")
            }
        }
    }

    fn normalized_set<I, S>(names: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| normalize_source_label(n.as_ref()))
            .collect()
    }

    pub fn passes(&self, entry: &RateEntry) -> bool {
        match self {
            VendorFilter::All => true,
            VendorFilter::Include(set) => set.contains(&normalize_source_label(&entry.source_file)),
            VendorFilter::Exclude(set) => !set.contains(&normalize_source_label(&entry.source_file)),
        }
    }
}

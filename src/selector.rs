//! Rate Selector/Aggregator
//!
//! The statistics that turn one filtered rate stream into a summary figure:
//!
//! - [`plain_average`] - arithmetic mean of every eligible rate
//! - [`cheapest_window`] - mean of the N cheapest (or most expensive) rates,
//!   optionally after discarding the single cheapest, with provenance
//! - [`lcr_tier_cost`] - the Nth-cheapest rate with small-sample fallback
//!   rules, with provenance
//!
//! All three treat an empty filtered input as a valid case yielding 0.0, never
//! an error. Intermediate averages are rounded to 6 fractional digits; final
//! formatting to the configured precision happens in the projector.
//!
//! Sorting is stable and ascending by value, so rates that compare equal keep
//! their insertion order. That order is the tie-break for every "first"
//! selection below.

use crate::models::RateEntry;
use crate::vendor::VendorFilter;

/// Result of a cheapest-window selection.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPick {
    pub average: f64,
    /// Source file of the extreme-most entry in the selected window, if any
    /// entry was selected.
    pub source_file: Option<String>,
}

/// Result of an LCR tier selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TierPick {
    pub cost: f64,
    /// Source file of the entry at the selected rank, when one was selected.
    pub source_file: Option<String>,
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn filtered_sorted<'a>(entries: &'a [RateEntry], filter: &VendorFilter) -> Vec<&'a RateEntry> {
    let mut eligible: Vec<&RateEntry> = entries.iter().filter(|e| filter.passes(e)).collect();
    eligible.sort_by(|a, b| a.value.total_cmp(&b.value));
    eligible
}

/// Arithmetic mean of every rate passing the filter; 0.0 when none do.
pub fn plain_average(entries: &[RateEntry], filter: &VendorFilter) -> f64 {
    let eligible: Vec<f64> = entries
        .iter()
        .filter(|e| filter.passes(e))
        .map(|e| e.value)
        .collect();
    if eligible.is_empty() {
        return 0.0;
    }
    round6(eligible.iter().sum::<f64>() / eligible.len() as f64)
}

/// Mean of the first `n` rates after sorting, optionally reversed and
/// optionally with the single extreme-most rate discarded first.
pub fn cheapest_window(
    entries: &[RateEntry],
    filter: &VendorFilter,
    n: usize,
    exclude_first_cheapest: bool,
    most_expensive: bool,
) -> WindowPick {
    let mut eligible = filtered_sorted(entries, filter);
    if most_expensive {
        eligible.reverse();
    }
    if exclude_first_cheapest && !eligible.is_empty() {
        eligible.remove(0);
    }
    eligible.truncate(n);

    if eligible.is_empty() {
        return WindowPick {
            average: 0.0,
            source_file: None,
        };
    }

    let average = round6(eligible.iter().map(|e| e.value).sum::<f64>() / eligible.len() as f64);
    WindowPick {
        average,
        source_file: Some(eligible[0].source_file.clone()),
    }
}

/// The LCR tier cost: the rate at rank `n` (1-indexed) among the sorted
/// eligible rates, with fixed fallbacks for small samples.
///
/// By eligible count `k`, checked in this exact order:
/// - `k == 0` yields 0.0
/// - `k == 1`, `2`, `3` yield the 1st, 2nd, 3rd sorted value respectively,
///   regardless of `n`
/// - `k >= n` yields the value at rank `n`
/// - otherwise (`3 < k < n`) yields 0.0
///
/// The last branch is a faithfully preserved quirk of the historical tier
/// logic; see DESIGN.md before changing it.
pub fn lcr_tier_cost(entries: &[RateEntry], filter: &VendorFilter, n: usize) -> TierPick {
    let eligible = filtered_sorted(entries, filter);

    let selected = match eligible.len() {
        0 => None,
        1 => Some(&eligible[0]),
        2 => Some(&eligible[1]),
        3 => Some(&eligible[2]),
        k if k >= n && n >= 1 => Some(&eligible[n - 1]),
        _ => None,
    };

    match selected {
        Some(entry) => TierPick {
            cost: entry.value,
            source_file: Some(entry.source_file.clone()),
        },
        None => TierPick {
            cost: 0.0,
            source_file: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(values: &[(f64, &str)]) -> Vec<RateEntry> {
        values
            .iter()
            .map(|(v, f)| RateEntry::new(*v, *f))
            .collect()
    }

    #[test]
    fn plain_average_is_mean_of_eligible_values() {
        let rates = entries(&[(0.05, "a.csv"), (0.03, "a.csv"), (0.10, "b.csv")]);
        let avg = plain_average(&rates, &VendorFilter::All);
        assert_eq!(avg, 0.06);
    }

    #[test]
    fn plain_average_of_empty_input_is_zero() {
        assert_eq!(plain_average(&[], &VendorFilter::All), 0.0);
    }

    #[test]
    fn plain_average_respects_filter() {
        let rates = entries(&[(0.05, "a.csv"), (0.03, "b.csv")]);
        let filter = VendorFilter::include(["a"]);
        assert_eq!(plain_average(&rates, &filter), 0.05);
    }

    #[test]
    fn window_takes_the_k_smallest_with_provenance() {
        let rates = entries(&[
            (0.09, "c.csv"),
            (0.03, "a.csv"),
            (0.05, "b.csv"),
            (0.20, "d.csv"),
        ]);
        let pick = cheapest_window(&rates, &VendorFilter::All, 2, false, false);
        assert_eq!(pick.average, 0.04);
        assert_eq!(pick.source_file.as_deref(), Some("a.csv"));
    }

    #[test]
    fn window_exclude_first_drops_exactly_one() {
        let rates = entries(&[(0.05, "a.csv"), (0.03, "a.csv"), (0.10, "b.csv")]);
        // Drop 0.03, then take the single next cheapest.
        let pick = cheapest_window(&rates, &VendorFilter::All, 1, true, false);
        assert_eq!(pick.average, 0.05);
        assert_eq!(pick.source_file.as_deref(), Some("a.csv"));
    }

    #[test]
    fn window_shrinks_when_fewer_than_n_remain() {
        let rates = entries(&[(0.02, "a.csv"), (0.04, "b.csv")]);
        let pick = cheapest_window(&rates, &VendorFilter::All, 5, true, false);
        assert_eq!(pick.average, 0.04);
        assert_eq!(pick.source_file.as_deref(), Some("b.csv"));
    }

    #[test]
    fn window_most_expensive_reverses_the_order() {
        let rates = entries(&[(0.02, "a.csv"), (0.04, "b.csv"), (0.10, "c.csv")]);
        let pick = cheapest_window(&rates, &VendorFilter::All, 2, false, true);
        assert_eq!(pick.average, 0.07);
        assert_eq!(pick.source_file.as_deref(), Some("c.csv"));
    }

    #[test]
    fn window_most_expensive_with_exclusion_drops_the_largest() {
        let rates = entries(&[(0.02, "a.csv"), (0.04, "b.csv"), (0.10, "c.csv")]);
        let pick = cheapest_window(&rates, &VendorFilter::All, 2, true, true);
        assert_eq!(pick.average, 0.03);
        assert_eq!(pick.source_file.as_deref(), Some("b.csv"));
    }

    #[test]
    fn window_on_empty_input_has_no_provenance() {
        let pick = cheapest_window(&[], &VendorFilter::All, 4, true, false);
        assert_eq!(pick.average, 0.0);
        assert_eq!(pick.source_file, None);
    }

    #[test]
    fn window_ties_keep_insertion_order() {
        let rates = entries(&[(0.05, "first.csv"), (0.05, "second.csv")]);
        let pick = cheapest_window(&rates, &VendorFilter::All, 1, false, false);
        assert_eq!(pick.source_file.as_deref(), Some("first.csv"));
    }

    #[test]
    fn tier_small_samples_pick_the_most_expensive() {
        let one = entries(&[(0.05, "a.csv")]);
        assert_eq!(lcr_tier_cost(&one, &VendorFilter::All, 4).cost, 0.05);

        let two = entries(&[(0.05, "a.csv"), (0.02, "b.csv")]);
        let pick = lcr_tier_cost(&two, &VendorFilter::All, 4);
        assert_eq!(pick.cost, 0.05);
        assert_eq!(pick.source_file.as_deref(), Some("a.csv"));

        let three = entries(&[(0.05, "a.csv"), (0.03, "a.csv"), (0.10, "b.csv")]);
        let pick = lcr_tier_cost(&three, &VendorFilter::All, 4);
        assert_eq!(pick.cost, 0.10);
        assert_eq!(pick.source_file.as_deref(), Some("b.csv"));
    }

    #[test]
    fn tier_uses_rank_n_when_enough_entries() {
        let rates = entries(&[
            (0.09, "d.csv"),
            (0.03, "a.csv"),
            (0.05, "b.csv"),
            (0.07, "c.csv"),
            (0.20, "e.csv"),
        ]);
        let pick = lcr_tier_cost(&rates, &VendorFilter::All, 4);
        assert_eq!(pick.cost, 0.09);
        assert_eq!(pick.source_file.as_deref(), Some("d.csv"));
    }

    #[test]
    fn tier_small_sample_rules_win_over_rank_n() {
        // k == 3 with n == 2 selects the 3rd value, not rank 2.
        let rates = entries(&[(0.01, "a.csv"), (0.02, "b.csv"), (0.03, "c.csv")]);
        assert_eq!(lcr_tier_cost(&rates, &VendorFilter::All, 2).cost, 0.03);
    }

    #[test]
    fn tier_gap_between_three_and_n_yields_zero() {
        // 3 < k < n: historical fallback to 0.0, preserved as-is.
        let rates = entries(&[
            (0.01, "a.csv"),
            (0.02, "b.csv"),
            (0.03, "c.csv"),
            (0.04, "d.csv"),
        ]);
        let pick = lcr_tier_cost(&rates, &VendorFilter::All, 6);
        assert_eq!(pick.cost, 0.0);
        assert_eq!(pick.source_file, None);
    }

    #[test]
    fn tier_on_empty_input_yields_zero_without_provenance() {
        let pick = lcr_tier_cost(&[], &VendorFilter::All, 4);
        assert_eq!(pick.cost, 0.0);
        assert_eq!(pick.source_file, None);
    }

    #[test]
    fn tier_filter_applies_before_counting() {
        // Four entries, but only three pass the filter: k == 3 rule applies.
        let rates = entries(&[
            (0.01, "a.csv"),
            (0.02, "b.csv"),
            (0.03, "c.csv"),
            (0.04, "skip.csv"),
        ]);
        let filter = VendorFilter::exclude(["skip"]);
        assert_eq!(lcr_tier_cost(&rates, &filter, 4).cost, 0.03);
    }

    #[test]
    fn internal_rounding_is_six_digits() {
        let rates = entries(&[(0.1, "a.csv"), (0.2, "a.csv"), (0.2, "a.csv")]);
        // 0.5 / 3 = 0.166666..., rounded to 6 fractional digits.
        assert_eq!(plain_average(&rates, &VendorFilter::All), 0.166667);
    }
}

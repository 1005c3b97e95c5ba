//! Anomaly Classifier
//!
//! Partitions incoming rows into "normal" and "above-threshold" before they
//! reach the ledger. A row is anomalous when any of its three rate cells is
//! non-empty and parses to a value strictly greater than the configured
//! threshold. Anomalous rows are set aside verbatim for separate reporting and
//! never contribute entries to the main aggregate.
//!
//! A non-empty cell that fails to parse is a separate, independently reported
//! condition: it yields a warning annotation for the operator but neither
//! forces anomaly classification nor blocks ledger insertion (the ledger
//! already treats such cells as absent).

use crate::models::{RateStream, RawRow};

/// Outcome of classifying one row against the rate threshold.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub anomalous: bool,
    /// One annotation per malformed numeric cell encountered.
    pub warnings: Vec<String>,
}

pub fn classify(row: &RawRow, threshold: f64) -> Classification {
    let mut result = Classification::default();

    for stream in RateStream::ALL {
        let cell = row.field(stream.column());
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => {
                if value > threshold {
                    result.anomalous = true;
                }
            }
            Err(_) => result.warnings.push(format!(
                "{}: prefix {}: column {:?} holds non-numeric rate {:?}",
                row.source_file,
                row.prefix,
                stream.column(),
                trimmed
            )),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{COL_RATE_INTER, COL_RATE_INTRA, COL_RATE_VENDOR};

    fn row(fields: &[(&str, &str)]) -> RawRow {
        RawRow {
            prefix: "44".to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            source_file: "a.csv".to_string(),
        }
    }

    #[test]
    fn rate_above_threshold_is_anomalous() {
        let c = classify(&row(&[(COL_RATE_VENDOR, "1.5")]), 1.0);
        assert!(c.anomalous);
        assert!(c.warnings.is_empty());
    }

    #[test]
    fn rate_equal_to_threshold_is_not_anomalous() {
        let c = classify(&row(&[(COL_RATE_VENDOR, "1.0")]), 1.0);
        assert!(!c.anomalous);
    }

    #[test]
    fn any_of_the_three_cells_can_trip_the_threshold() {
        for column in [COL_RATE_INTER, COL_RATE_INTRA, COL_RATE_VENDOR] {
            let c = classify(&row(&[(column, "2.0")]), 1.0);
            assert!(c.anomalous, "column {column} did not trip");
        }
    }

    #[test]
    fn malformed_cell_warns_but_does_not_force_anomaly() {
        let c = classify(&row(&[(COL_RATE_INTER, "abc"), (COL_RATE_VENDOR, "0.5")]), 1.0);
        assert!(!c.anomalous);
        assert_eq!(c.warnings.len(), 1);
        assert!(c.warnings[0].contains("abc"));
    }

    #[test]
    fn malformed_and_high_rate_are_reported_independently() {
        let c = classify(&row(&[(COL_RATE_INTER, "abc"), (COL_RATE_VENDOR, "5.0")]), 1.0);
        assert!(c.anomalous);
        assert_eq!(c.warnings.len(), 1);
    }

    #[test]
    fn empty_cells_are_ignored() {
        let c = classify(&row(&[(COL_RATE_INTER, ""), (COL_RATE_VENDOR, "  ")]), 1.0);
        assert!(!c.anomalous);
        assert!(c.warnings.is_empty());
    }
}

//! Row Ingestion and Batch Assembly
//!
//! Turns input paths into a fully populated [`Batch`]: expands globs to CSV
//! files, decodes bytes (UTF-8 with a latin-1 fallback), parses rows with the
//! `csv` crate, classifies each row against the anomaly threshold, and folds
//! the survivors into the prefix ledger.
//!
//! Per-file parsing fans out over rayon; the merge into the shared ledger is
//! serialized in input-path order so entry insertion order - the tie-break for
//! "first" selection semantics - stays deterministic.
//!
//! Error policy:
//! - A structurally invalid file (no `Prefix` header, a row with an empty
//!   prefix) is a [`SchemaViolation`] and aborts the whole batch with a
//!   diagnostic naming the offending file.
//! - Any other per-source failure (unreadable file, I/O error) fails that
//!   source only; remaining sources still process, and the failure is
//!   recorded on the batch so it is never mistaken for "zero matching
//!   prefixes". If every source fails, the batch fails.
//! - Malformed individual cells never propagate; they are logged and counted.

use crate::classifier::classify;
use crate::ledger::PrefixLedger;
use crate::models::{AnomalousRow, FileSummary, RawRow, COL_PREFIX, COL_VENDOR};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Structural input violation: fatal for the whole batch, not just the source.
#[derive(Debug)]
pub struct SchemaViolation(pub String);

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SchemaViolation {}

/// A source that failed to parse for non-structural reasons.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SourceFailure {
    pub filename: String,
    pub error: String,
}

/// All state accumulated for one aggregation run. Freshly allocated per
/// invocation; nothing survives into the next batch.
#[derive(Debug)]
pub struct Batch {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ledger: PrefixLedger,
    pub anomalies: Vec<AnomalousRow>,
    pub file_summaries: Vec<FileSummary>,
    /// Distinct non-empty `Vendor` cell values seen across the batch, sorted.
    pub vendor_names: Vec<String>,
    pub failed_sources: Vec<SourceFailure>,
}

impl Batch {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            ledger: PrefixLedger::new(),
            anomalies: Vec::new(),
            file_summaries: Vec::new(),
            vendor_names: Vec::new(),
            failed_sources: Vec::new(),
        }
    }
}

/// Expand CLI path arguments into an ordered, deduplicated list of CSV files.
///
/// Each argument may be a file, a directory (its `*.csv` members are taken),
/// or a glob pattern. Matching nothing at all is an error so that a mistyped
/// path cannot silently produce an empty, successful-looking run.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut seen = HashSet::new();

    let mut push = |path: PathBuf| {
        if path.extension().map_or(false, |ext| ext == "csv") {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        } else {
            warn!(path = %path.display(), "skipping non-CSV input");
        }
    };

    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            push(path.to_path_buf());
        } else if path.is_dir() {
            let dir_pattern = path.join("*.csv");
            for entry in glob::glob(&dir_pattern.to_string_lossy())
                .with_context(|| format!("invalid directory pattern: {}", pattern))?
                .flatten()
            {
                push(entry);
            }
        } else {
            let matches = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern: {}", pattern))?;
            let mut matched_any = false;
            for entry in matches.flatten() {
                matched_any = true;
                push(entry);
            }
            if !matched_any {
                warn!(pattern, "input pattern matched no files");
            }
        }
    }

    if files.is_empty() {
        bail!("no CSV input files matched the given paths");
    }
    Ok(files)
}

/// Decode raw file bytes: UTF-8 first, latin-1 fallback.
fn decode_text(bytes: Vec<u8>, filename: &str) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            warn!(filename, "input is not valid UTF-8, falling back to latin-1");
            err.into_bytes().iter().map(|&b| b as char).collect()
        }
    }
}

/// Parse one CSV file into raw rows.
///
/// The header must contain a `Prefix` column and every row must carry a
/// non-empty prefix value; either violation is a [`SchemaViolation`].
pub fn parse_csv_file(path: &Path) -> Result<Vec<RawRow>> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let text = decode_text(bytes, &filename);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("{}: failed to read CSV header", filename))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if !headers.iter().any(|h| h == COL_PREFIX) {
        return Err(SchemaViolation(format!(
            "{}: rate sheet has no {:?} column",
            filename, COL_PREFIX
        ))
        .into());
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("{}: failed to read CSV record", filename))?;

        let mut fields = HashMap::with_capacity(headers.len());
        for (column, header) in headers.iter().enumerate() {
            fields.insert(
                header.clone(),
                record.get(column).unwrap_or("").to_string(),
            );
        }

        let prefix = fields
            .get(COL_PREFIX)
            .map(|p| p.trim().to_string())
            .unwrap_or_default();
        if prefix.is_empty() {
            // Header line is row 1, so data row N sits on line N + 1.
            return Err(SchemaViolation(format!(
                "{}: row {} has no prefix value",
                filename,
                index + 2
            ))
            .into());
        }

        rows.push(RawRow {
            prefix,
            fields,
            source_file: filename.clone(),
        });
    }

    debug!(filename, rows = rows.len(), "parsed rate sheet");
    Ok(rows)
}

/// Ingest every input file into a fresh batch.
///
/// Files parse in parallel; merging happens afterwards in input order. Rows
/// whose rates exceed `rate_threshold` divert to the anomaly list instead of
/// the ledger.
pub fn ingest_files(paths: &[PathBuf], rate_threshold: f64) -> Result<Batch> {
    if paths.is_empty() {
        bail!("no CSV input files to ingest");
    }

    let parsed: Vec<(&PathBuf, Result<Vec<RawRow>>)> = paths
        .par_iter()
        .map(|path| (path, parse_csv_file(path)))
        .collect();

    let mut batch = Batch::new();
    let mut vendors: BTreeSet<String> = BTreeSet::new();

    for (path, outcome) in parsed {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let rows = match outcome {
            Ok(rows) => rows,
            Err(err) if err.downcast_ref::<SchemaViolation>().is_some() => {
                return Err(err);
            }
            Err(err) => {
                warn!(filename, error = %err, "skipping unreadable source");
                batch.failed_sources.push(SourceFailure {
                    filename,
                    error: format!("{err:#}"),
                });
                continue;
            }
        };

        let mut prefixes_seen: HashSet<&str> = HashSet::new();
        let mut anomalous_rows = 0usize;
        let mut malformed_cells = 0usize;

        for row in &rows {
            let vendor = row.field(COL_VENDOR).trim();
            if !vendor.is_empty() {
                vendors.insert(vendor.to_string());
            }
            prefixes_seen.insert(row.prefix.as_str());

            let classification = classify(row, rate_threshold);
            for warning in &classification.warnings {
                warn!(filename = %row.source_file, "{warning}");
            }
            malformed_cells += classification.warnings.len();

            if classification.anomalous {
                anomalous_rows += 1;
                batch.anomalies.push(AnomalousRow {
                    prefix: row.prefix.clone(),
                    fields: row.fields.clone(),
                    source_file: row.source_file.clone(),
                    warnings: classification.warnings,
                });
            } else {
                batch.ledger.record_row(row);
            }
        }

        batch.file_summaries.push(FileSummary {
            filename,
            total_prefix_count: prefixes_seen.len(),
            anomalous_row_count: anomalous_rows,
            malformed_cell_count: malformed_cells,
        });
    }

    if batch.file_summaries.is_empty() {
        bail!(
            "all {} input source(s) failed to parse; nothing to aggregate",
            batch.failed_sources.len()
        );
    }

    batch.vendor_names = vendors.into_iter().collect();
    info!(
        batch_id = %batch.id,
        files = batch.file_summaries.len(),
        prefixes = batch.ledger.len(),
        anomalies = batch.anomalies.len(),
        "batch ingested"
    );
    Ok(batch)
}
